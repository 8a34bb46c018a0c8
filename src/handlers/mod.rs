pub mod exercises;
pub mod health;
pub mod journals;
pub mod meals;
