pub mod models;
pub mod queries;
pub mod snapshot;
pub mod sqlite;

pub use models::{FileRecord, PriorRecord};
pub use snapshot::Snapshot;
pub use sqlite::Store;
