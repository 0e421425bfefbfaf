//! Progress handler trait and events

use crate::report::RunStatus;
use crate::toolchain::EnvironmentId;
use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while a build request is processed
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Request accepted after validation
    Started {
        action: String,
        environment: EnvironmentId,
    },

    /// Workspace directory created
    WorkspaceStaged { path: PathBuf },

    /// Archive unpacked into the workspace
    ArchiveExtracted {
        files: usize,
        skipped: usize,
        extract_time: Duration,
    },

    /// Build step started
    BuildStarted { environment: EnvironmentId },

    /// Build step finished
    BuildComplete {
        failed: bool,
        build_time: Duration,
    },

    /// Visible run launched
    RunStarted { environment: EnvironmentId },

    /// Visible run returned
    RunComplete { started: bool, error: Option<String> },

    /// Run step skipped because the build failed
    RunSkipped,

    /// Workspace removal attempted
    WorkspaceCleaned { path: PathBuf, removed: bool },

    /// Request finished with a report
    Completed {
        run_status: RunStatus,
        total_time: Duration,
    },

    /// Request failed before a report was produced
    Failed { error: String },
}

/// Trait for handling progress events during request processing
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}
