pub mod extractor;
pub mod prompt;
pub mod providers;
pub mod search;

pub use search::resolve_work;
