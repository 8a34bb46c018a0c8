pub mod entry_status;
pub mod exercise;
pub mod journal;
pub mod meal;
pub mod patient;
