pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod index;
pub mod progress;
pub mod reconcile;
pub mod scanner;
pub mod scheduler;
pub mod storage;
pub mod tree;

pub use config::AppConfig;
pub use engine::{IndexEngine, IndexResult};
pub use error::Error;
pub use index::{Outcome, OutcomeTally};
pub use progress::{ProgressReporter, SilentReporter};
