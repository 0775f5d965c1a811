pub mod append;
pub mod capability;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod jsonc;
pub mod merge;
pub mod outline;
pub mod paths;
pub mod split;
pub mod sync;
pub mod task;
pub mod tree;
pub mod types;

pub use error::{Result, SyncError};
