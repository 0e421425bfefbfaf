//! Request orchestration: validate, stage, unpack, build, maybe run, tear down

use crate::archive::{self, ArchiveError};
use crate::config::CodeforgeConfig;
use crate::process::ProcessRunner;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::report::{BuildReport, RunStatus};
use crate::request::{BuildRequest, RequestEnvelope, RequestError};
use crate::toolchain::ToolchainSelector;
use crate::workspace::Workspace;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to create workspace root {}: {source}", .path.display())]
    WorkspaceRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create workspace: {0}")]
    Workspace(#[source] io::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Turns one build request into one report.
///
/// Holds no per-request state: requests may be processed concurrently through a
/// shared `Arc<BuildOrchestrator>`, each in its own workspace.
pub struct BuildOrchestrator {
    workspace_root: PathBuf,
    selector: ToolchainSelector,
    progress: Arc<dyn ProgressHandler>,
}

impl BuildOrchestrator {
    pub fn new(
        config: &CodeforgeConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, ProcessingError> {
        let selector = ToolchainSelector::new(config.toolchain_settings(), runner);
        Self::with_root(config.workspace_root.clone(), selector)
    }

    /// Creates the workspace root if it does not exist yet.
    pub fn with_root(
        workspace_root: PathBuf,
        selector: ToolchainSelector,
    ) -> Result<Self, ProcessingError> {
        std::fs::create_dir_all(&workspace_root).map_err(|source| {
            ProcessingError::WorkspaceRoot {
                path: workspace_root.clone(),
                source,
            }
        })?;
        info!("Workspace root: {}", workspace_root.display());

        Ok(Self {
            workspace_root,
            selector,
            progress: Arc::new(NoOpHandler),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Validates a wire envelope and executes it.
    pub async fn process(&self, envelope: RequestEnvelope) -> Result<BuildReport, ProcessingError> {
        let request = match BuildRequest::try_from(envelope) {
            Ok(request) => request,
            Err(e) => {
                self.progress.on_progress(&ProgressEvent::Failed {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };
        self.execute(request).await
    }

    /// Runs a validated request. The workspace is removed on every path out of
    /// here, including extraction errors.
    pub async fn execute(&self, request: BuildRequest) -> Result<BuildReport, ProcessingError> {
        let start = Instant::now();
        self.progress.on_progress(&ProgressEvent::Started {
            action: request.action.to_string(),
            environment: request.environment,
        });

        let workspace =
            Workspace::create(&self.workspace_root).map_err(ProcessingError::Workspace)?;
        let path = workspace.path().to_path_buf();
        self.progress
            .on_progress(&ProgressEvent::WorkspaceStaged { path: path.clone() });

        let result = self.build_in(&path, request).await;

        let removed = workspace.teardown().await;
        self.progress
            .on_progress(&ProgressEvent::WorkspaceCleaned { path, removed });

        match &result {
            Ok(report) => self.progress.on_progress(&ProgressEvent::Completed {
                run_status: report.run_status(),
                total_time: start.elapsed(),
            }),
            Err(e) => self.progress.on_progress(&ProgressEvent::Failed {
                error: e.to_string(),
            }),
        }

        result
    }

    async fn build_in(
        &self,
        workspace: &Path,
        request: BuildRequest,
    ) -> Result<BuildReport, ProcessingError> {
        let BuildRequest {
            action,
            environment,
            archive: bytes,
            tool_config,
        } = request;

        let extract_start = Instant::now();
        let summary = archive::extract(bytes, workspace.to_path_buf()).await?;
        self.progress.on_progress(&ProgressEvent::ArchiveExtracted {
            files: summary.files,
            skipped: summary.skipped,
            extract_time: extract_start.elapsed(),
        });

        let toolchain = self.selector.select(environment, tool_config.as_ref());

        self.progress
            .on_progress(&ProgressEvent::BuildStarted { environment });
        let build_start = Instant::now();
        let (build_output, failed) = match toolchain.build(workspace).await {
            Ok(output) => {
                let failed = toolchain.reports_failure(&output);
                (output, failed)
            }
            Err(e) => (format!("Error: {}", e), true),
        };
        self.progress.on_progress(&ProgressEvent::BuildComplete {
            failed,
            build_time: build_start.elapsed(),
        });

        if !action.runs() {
            return Ok(BuildReport::new(build_output, RunStatus::NotRequested));
        }

        if failed {
            self.progress.on_progress(&ProgressEvent::RunSkipped);
            return Ok(BuildReport::new(build_output, RunStatus::Skipped));
        }

        self.progress
            .on_progress(&ProgressEvent::RunStarted { environment });
        let outcome = toolchain.run(workspace).await;
        if let Some(message) = &outcome.error {
            error!("Run step for {} failed: {}", environment, message);
        }
        self.progress.on_progress(&ProgressEvent::RunComplete {
            started: outcome.started,
            error: outcome.error,
        });

        Ok(BuildReport::new(build_output, RunStatus::Initiated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcessRunner, MockResponse};
    use crate::request::Action;
    use crate::toolchain::{EnvironmentId, ToolchainConfig, ToolchainSettings};
    use std::fs;
    use tempfile::TempDir;

    fn orchestrator(root: &Path, runner: Arc<MockProcessRunner>) -> BuildOrchestrator {
        let selector = ToolchainSelector::new(ToolchainSettings::default(), runner);
        BuildOrchestrator::with_root(root.join("tmp_projects"), selector).unwrap()
    }

    fn project_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let src = TempDir::new().unwrap();
        for (name, contents) in files {
            let path = src.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        archive::pack_directory(src.path()).unwrap()
    }

    fn root_is_empty(orchestrator: &BuildOrchestrator) -> bool {
        fs::read_dir(orchestrator.workspace_root())
            .unwrap()
            .next()
            .is_none()
    }

    #[tokio::test]
    async fn test_creates_workspace_root() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(dir.path(), Arc::new(MockProcessRunner::new()));
        assert!(orchestrator.workspace_root().is_dir());
    }

    #[tokio::test]
    async fn test_build_only_never_runs() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        runner.add_response(MockResponse::output("Build succeeded."));
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::Build,
            EnvironmentId::CSharp,
            project_zip(&[("App.csproj", "<Project/>")]),
        );
        let report = orchestrator.execute(request).await.unwrap();

        assert_eq!(report.run_status(), RunStatus::NotRequested);
        assert_eq!(report.build_output(), "Build succeeded.");
        assert!(runner.visible_calls().is_empty());
        assert!(root_is_empty(&orchestrator));
    }

    #[tokio::test]
    async fn test_failed_build_skips_run() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        runner.add_response(MockResponse::output(
            "Program.cs(3,1): error CS1002: ; expected\n\nBuild FAILED.",
        ));
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::BuildAndRun,
            EnvironmentId::CSharp,
            project_zip(&[("Program.cs", "class P {}")]),
        );
        let report = orchestrator.execute(request).await.unwrap();

        assert_eq!(report.run_status(), RunStatus::Skipped);
        assert!(report.to_string().contains("--- Run Skipped ---"));
        assert!(runner.visible_calls().is_empty());
        assert!(root_is_empty(&orchestrator));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_as_output() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        runner.add_response(MockResponse::SpawnFailure);
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::Run,
            EnvironmentId::CSharp,
            project_zip(&[("Program.cs", "class P {}")]),
        );
        let report = orchestrator.execute(request).await.unwrap();

        assert!(report.build_output().starts_with("Error: "));
        assert_eq!(report.run_status(), RunStatus::Skipped);
        assert!(runner.visible_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cmake_error_text_still_runs() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::with_hook(|invocation| {
            let is_compile = invocation.args.first().map(String::as_str) == Some("--build");
            if let (true, Some(cwd)) = (is_compile, &invocation.working_dir) {
                let exe = cwd.join("build").join("hello.out");
                fs::create_dir_all(exe.parent().unwrap()).unwrap();
                fs::write(exe, b"\x7fELF").unwrap();
            }
        }));
        runner.add_responses([
            MockResponse::output("-- Configuring done\n-- Generating done"),
            MockResponse::output("main.cpp:4: warning: unused variable\nlinker error: none"),
        ]);
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::BuildAndRun,
            EnvironmentId::Cpp,
            project_zip(&[
                ("CMakeLists.txt", "project(hello)\nadd_executable(hello main.cpp)\n"),
                ("main.cpp", "int main() { return 0; }"),
            ]),
        );
        let report = orchestrator.execute(request).await.unwrap();

        assert_eq!(report.run_status(), RunStatus::Initiated);
        let visible = runner.visible_calls();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].program.ends_with("hello.out"));
        assert!(root_is_empty(&orchestrator));
    }

    #[tokio::test]
    async fn test_empty_board_skips_upload() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::BuildAndRun,
            EnvironmentId::Arduino,
            project_zip(&[("blink/blink.ino", "void setup() {}\nvoid loop() {}\n")]),
        )
        .with_tool_config(ToolchainConfig::new("", "COM3"));
        let report = orchestrator.execute(request).await.unwrap();

        assert_eq!(report.build_output(), "Error: Arduino board not specified.");
        assert_eq!(report.run_status(), RunStatus::Skipped);
        assert!(runner.calls().is_empty());
        assert!(root_is_empty(&orchestrator));
    }

    #[tokio::test]
    async fn test_invalid_archive_still_tears_down() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let request = BuildRequest::new(
            Action::Build,
            EnvironmentId::Cpp,
            b"definitely not a zip".to_vec(),
        );
        let err = orchestrator.execute(request).await.unwrap_err();

        assert!(matches!(err, ProcessingError::Archive(_)));
        assert!(runner.calls().is_empty());
        assert!(root_is_empty(&orchestrator));
    }

    #[tokio::test]
    async fn test_invalid_envelope_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockProcessRunner::new());
        let orchestrator = orchestrator(dir.path(), runner.clone());

        let envelope = RequestEnvelope {
            action: "build".to_string(),
            environment: "fortran".to_string(),
            payload: archive::encode_payload(&project_zip(&[("main.f90", "end")])),
            arduino_config: None,
        };
        let err = orchestrator.process(envelope).await.unwrap_err();

        assert!(err.to_string().contains("Unsupported environment: fortran"));
        assert!(root_is_empty(&orchestrator));
        assert!(runner.calls().is_empty());
    }
}
