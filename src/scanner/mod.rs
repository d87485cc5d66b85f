pub mod walk;

pub use walk::{relative_key, FileWalker};
