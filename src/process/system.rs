//! `ProcessRunner` backed by real OS processes

use super::{Invocation, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::env;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Header placed in front of captured stderr.
pub const ERROR_MARKER: &str = "Error executing command:";

/// `CODEFORGE_TERMINAL` value that disables terminal windows entirely.
pub const NO_TERMINAL: &str = "none";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Program that opens a new terminal window around a command, e.g.
/// `x-terminal-emulator -e <command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLauncher {
    program: String,
    args: Vec<String>,
}

impl TerminalLauncher {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolves a `CODEFORGE_TERMINAL` style setting: unset detects, `none`
    /// disables, anything else is an emulator that accepts `-e <command>`.
    pub fn from_setting(setting: Option<&str>) -> Option<Self> {
        match setting.map(str::trim) {
            None | Some("") => Self::detect(),
            Some(value) if value.eq_ignore_ascii_case(NO_TERMINAL) => None,
            Some(program) => Some(Self::new(program, ["-e"])),
        }
    }

    /// `cmd.exe /c start` on Windows; `$TERMINAL` or `x-terminal-emulator` on Unix.
    pub fn detect() -> Option<Self> {
        if cfg!(windows) {
            // `start` takes its first quoted argument as the window title; the
            // space forces quoting.
            return Some(Self::new("cmd.exe", ["/c", "start", "codeforge run", "/wait"]));
        }

        if let Some(terminal) = env::var("TERMINAL").ok().filter(|t| !t.trim().is_empty()) {
            return Some(Self::new(terminal.trim(), ["-e"]));
        }

        find_on_path("x-terminal-emulator").map(|_| Self::new("x-terminal-emulator", ["-e"]))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The invocation that runs `invocation` inside a new terminal window.
    pub fn wrap(&self, invocation: &Invocation) -> Invocation {
        let mut wrapped = Invocation::new(&self.program)
            .args(self.args.iter().cloned())
            .arg(&invocation.program)
            .args(invocation.args.iter().cloned());
        wrapped.working_dir = invocation.working_dir.clone();
        wrapped
    }
}

fn find_on_path(program: &str) -> Option<std::path::PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Runner for real processes. One instance can be shared by every request.
///
/// Visible launches never hand the child this process's stdin or stdout: those
/// carry requests and replies in `serve` mode. Without a terminal launcher the
/// child runs with a null stdin and its stdout folded into stderr.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    terminal: Option<TerminalLauncher>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::with_terminal(TerminalLauncher::detect())
    }

    pub fn with_terminal(terminal: Option<TerminalLauncher>) -> Self {
        Self { terminal }
    }

    /// No terminal windows; visible runs fall back to stderr.
    pub fn headless() -> Self {
        Self::with_terminal(None)
    }

    pub fn terminal(&self) -> Option<&TerminalLauncher> {
        self.terminal.as_ref()
    }

    fn command_for(&self, invocation: &Invocation, mode: &str) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);

        match invocation.working_dir.as_deref() {
            Some(dir) if dir.is_dir() => {
                debug!("Executing ({}) '{}' in '{}'", mode, invocation, dir.display());
                command.current_dir(dir);
            }
            _ => {
                debug!("Executing ({}) '{}' in current directory", mode, invocation);
            }
        }

        command
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle onto this process's stderr, for children whose stdout must not
/// reach our stdout.
fn stderr_stdio() -> Stdio {
    #[cfg(unix)]
    {
        use std::os::fd::AsFd;
        if let Ok(fd) = std::io::stderr().as_fd().try_clone_to_owned() {
            return Stdio::from(fd);
        }
    }
    #[cfg(windows)]
    {
        use std::os::windows::io::AsHandle;
        if let Ok(handle) = std::io::stderr().as_handle().try_clone_to_owned() {
            return Stdio::from(handle);
        }
    }
    Stdio::null()
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run_captured(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        let mut command = self.command_for(invocation, "headless");
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let io_error = |source: std::io::Error| ProcessError::Io {
            program: invocation.program.clone(),
            source,
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::try_join!(
            collect_lines(stdout),
            collect_lines(stderr),
            child.wait()
        )
        .map_err(io_error)?;

        debug!(program = %invocation.program, status = ?status.code(), "Captured process exited");

        Ok(format_captured(&stdout, &stderr))
    }

    async fn run_visible(&self, invocation: &Invocation) -> Result<(), ProcessError> {
        if invocation.redirect_output {
            return Err(ProcessError::RedirectedVisibleLaunch {
                program: invocation.program.clone(),
            });
        }

        let launched = match &self.terminal {
            Some(terminal) => terminal.wrap(invocation),
            None => {
                warn!(
                    "No terminal available, running '{}' without a window (output goes to stderr)",
                    invocation
                );
                invocation.clone()
            }
        };

        let mut command = self.command_for(&launched, "visible");
        command
            .stdin(Stdio::null())
            .stdout(stderr_stdio())
            .stderr(Stdio::inherit());

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: launched.program.clone(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ProcessError::Io {
            program: launched.program.clone(),
            source,
        })?;

        debug!(program = %launched.program, status = ?status.code(), "Visible process exited");
        Ok(())
    }
}

/// Reads a pipe line by line. Invalid UTF-8 is replaced rather than rejected.
async fn collect_lines<R>(reader: Option<R>) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(reader);
    let mut buffer = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        buffer.push_str(text.trim_end_matches(|c| c == '\r' || c == '\n'));
        buffer.push('\n');
    }

    Ok(buffer)
}

/// Folds separately captured streams into the single report string.
pub fn format_captured(stdout: &str, stderr: &str) -> String {
    let output = stdout.trim();
    let error = stderr.trim();

    if error.is_empty() {
        output.to_string()
    } else {
        format!("{}\n{}\nOutput:\n{}", ERROR_MARKER, error, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_captured_stdout_only() {
        assert_eq!(format_captured("  Build succeeded.\n\n", ""), "Build succeeded.");
    }

    #[test]
    fn test_format_captured_with_stderr() {
        let formatted = format_captured("partial\n", "warning: deprecated\n");
        assert_eq!(
            formatted,
            "Error executing command:\nwarning: deprecated\nOutput:\npartial"
        );
    }

    #[test]
    fn test_format_captured_whitespace_stderr_ignored() {
        assert_eq!(format_captured("ok", " \n\t\n"), "ok");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = SystemRunner::new();
        let invocation = Invocation::new("codeforge-definitely-not-a-real-program");

        match runner.run_captured(&invocation).await {
            Err(ProcessError::Spawn { program, .. }) => {
                assert_eq!(program, "codeforge-definitely-not-a-real-program");
            }
            other => panic!("Expected Spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_visible_rejects_redirection_before_spawning() {
        let runner = SystemRunner::new();
        let invocation = Invocation::new("codeforge-definitely-not-a-real-program").redirect_output();

        match runner.run_visible(&invocation).await {
            Err(ProcessError::RedirectedVisibleLaunch { .. }) => {}
            other => panic!("Expected RedirectedVisibleLaunch, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captured_collects_both_streams() {
        let runner = SystemRunner::new();
        let invocation = Invocation::new("sh")
            .arg("-c")
            .arg("echo out-line; echo err-line 1>&2");

        let output = runner.run_captured(&invocation).await.unwrap();
        assert_eq!(output, "Error executing command:\nerr-line\nOutput:\nout-line");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captured_uses_existing_working_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "x").unwrap();

        let runner = SystemRunner::new();
        let invocation = Invocation::new("ls").current_dir(temp_dir.path());

        let output = runner.run_captured(&invocation).await.unwrap();
        assert_eq!(output, "marker.txt");
    }

    #[test]
    fn test_launcher_wraps_program_and_args() {
        let launcher = TerminalLauncher::new("xterm", ["-e"]);
        let invocation = Invocation::new("dotnet").arg("run").current_dir("/tmp/proj");

        let wrapped = launcher.wrap(&invocation);
        assert_eq!(wrapped.program, "xterm");
        assert_eq!(wrapped.args, vec!["-e", "dotnet", "run"]);
        assert_eq!(wrapped.working_dir, invocation.working_dir);
        assert!(!wrapped.redirect_output);
    }

    #[test]
    fn test_launcher_setting_none_disables_terminal() {
        assert_eq!(TerminalLauncher::from_setting(Some("none")), None);
        assert_eq!(TerminalLauncher::from_setting(Some("NONE")), None);
    }

    #[test]
    fn test_launcher_setting_names_emulator() {
        let launcher = TerminalLauncher::from_setting(Some("alacritty")).unwrap();
        assert_eq!(launcher, TerminalLauncher::new("alacritty", ["-e"]));
        assert_eq!(launcher.program(), "alacritty");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_headless_visible_child_gets_no_stdin() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let runner = SystemRunner::headless();
        let invocation = Invocation::new("sh")
            .arg("-c")
            .arg("read line; echo \"[$line]\" > marker.txt")
            .current_dir(temp_dir.path());

        runner.run_visible(&invocation).await.unwrap();

        let marker = std::fs::read_to_string(temp_dir.path().join("marker.txt")).unwrap();
        assert_eq!(marker.trim(), "[]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_visible_runs_inside_terminal_launcher() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        // `env` stands in for an emulator: it runs the wrapped command as-is.
        let runner = SystemRunner::with_terminal(Some(TerminalLauncher::new(
            "env",
            Vec::<String>::new(),
        )));
        let invocation = Invocation::new("touch")
            .arg("launched.txt")
            .current_dir(temp_dir.path());

        runner.run_visible(&invocation).await.unwrap();
        assert!(temp_dir.path().join("launched.txt").exists());
    }
}
