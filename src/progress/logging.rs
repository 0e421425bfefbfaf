//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                action,
                environment,
            } => {
                info!(action = %action, environment = %environment, "Processing request");
            }
            ProgressEvent::WorkspaceStaged { path } => {
                debug!(workspace = %path.display(), "Workspace staged");
            }
            ProgressEvent::ArchiveExtracted {
                files,
                skipped,
                extract_time,
            } => {
                if *skipped > 0 {
                    warn!(
                        files,
                        skipped,
                        extract_time_ms = extract_time.as_millis(),
                        "Archive extracted with skipped entries"
                    );
                } else {
                    info!(
                        files,
                        extract_time_ms = extract_time.as_millis(),
                        "Archive extracted"
                    );
                }
            }
            ProgressEvent::BuildStarted { environment } => {
                info!(environment = %environment, "Starting build");
            }
            ProgressEvent::BuildComplete { failed, build_time } => {
                if *failed {
                    warn!(build_time_ms = build_time.as_millis(), "Build reported failure");
                } else {
                    info!(build_time_ms = build_time.as_millis(), "Build complete");
                }
            }
            ProgressEvent::RunStarted { environment } => {
                info!(environment = %environment, "Launching visible run");
            }
            ProgressEvent::RunComplete { started, error } => match error {
                Some(message) => error!(started, error = %message, "Run failed"),
                None => debug!(started, "Run returned"),
            },
            ProgressEvent::RunSkipped => {
                info!("Build failed, run skipped");
            }
            ProgressEvent::WorkspaceCleaned { path, removed } => {
                if *removed {
                    debug!(workspace = %path.display(), "Workspace removed");
                } else {
                    warn!(workspace = %path.display(), "Workspace left behind");
                }
            }
            ProgressEvent::Completed {
                run_status,
                total_time,
            } => {
                info!(
                    run_status = ?run_status,
                    total_time_ms = total_time.as_millis(),
                    "Request complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Request failed");
            }
        }
    }
}
