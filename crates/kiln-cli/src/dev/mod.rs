//! Development server: static serving of the output directory, a build
//! status endpoint and a debounced file watcher that drives rebuilds.

pub mod server;
pub mod state;
pub mod watcher;

pub use server::{DevServer, STATUS_PATH, router};
pub use state::{BuildStatus, DevServerState, SharedState, StatusResponse};
pub use watcher::{FileChange, FileWatcher, IgnoreSet};
