pub mod analyzer;
pub mod completion;
pub mod entries;
pub mod journals;
pub mod kind;
pub mod normalize;
pub mod prompt;
pub mod rate_limit;
pub mod retry;
pub mod weekly;
