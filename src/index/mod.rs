pub mod classify;
pub mod indexer;
pub mod tally;

pub use classify::{classify, Outcome};
pub use indexer::{format_modified, FileIndexer, UnitReport};
pub use tally::OutcomeTally;
