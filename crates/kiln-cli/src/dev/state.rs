//! Shared state for the development server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Outcome of the most recent build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BuildStatus {
    NotStarted,
    InProgress,
    Success { duration_ms: u64, files: usize },
    /// The build aborted, or some files failed; `error` names them
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    pub fn is_not_started(&self) -> bool {
        matches!(self, BuildStatus::NotStarted)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Body of `GET /__kiln/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: BuildStatus,
    /// Builds started since the server came up
    pub builds: u64,
}

pub struct DevServerState {
    status: RwLock<BuildStatus>,
    builds: RwLock<u64>,
    out_dir: PathBuf,
}

impl DevServerState {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            builds: RwLock::new(0),
            out_dir,
        }
    }

    pub fn start_build(&self) {
        *self.builds.write() += 1;
        *self.status.write() = BuildStatus::InProgress;
    }

    pub fn complete_build(&self, duration_ms: u64, files: usize) {
        *self.status.write() = BuildStatus::Success { duration_ms, files };
    }

    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn get_status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn snapshot(&self) -> StatusResponse {
        StatusResponse {
            status: self.get_status(),
            builds: *self.builds.read(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

pub type SharedState = Arc<DevServerState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let state = DevServerState::new(PathBuf::from("dist"));
        assert!(state.get_status().is_not_started());

        state.start_build();
        assert!(state.get_status().is_in_progress());

        state.complete_build(12, 5);
        assert!(state.get_status().is_success());

        state.start_build();
        state.fail_build("src/app/index.js [script]: boom".to_string());
        assert_eq!(
            state.get_status().error(),
            Some("src/app/index.js [script]: boom")
        );
        assert_eq!(state.snapshot().builds, 2);
    }

    #[test]
    fn status_json_is_flat() {
        let state = DevServerState::new(PathBuf::from("dist"));
        state.start_build();
        state.complete_build(40, 3);

        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "duration_ms": 40,
                "files": 3,
                "builds": 1
            })
        );
    }
}
