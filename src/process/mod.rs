//! External process execution
//!
//! Toolchains are driven through the [`ProcessRunner`] trait, which exposes exactly
//! two execution modes:
//!
//! - **captured**: no window, stdout and stderr collected line by line and folded into
//!   a single report string;
//! - **visible**: launched in a new terminal window, nothing returned. The child never
//!   sees this process's stdin or stdout, which carry the `serve` protocol. Without a
//!   terminal it runs with a null stdin and stdout folded into stderr.
//!
//! Both modes hold the calling task until the child exits.

mod mock;
mod system;

pub use mock::{MockProcessRunner, MockResponse, RecordedCall};
pub use system::{format_captured, SystemRunner, TerminalLauncher, ERROR_MARKER, NO_TERMINAL};

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' cannot redirect its output when launched in a visible terminal")]
    RedirectedVisibleLaunch { program: String },
}

/// Program, arguments and working directory of a single external command.
///
/// Arguments are passed to the OS verbatim; no shell quoting is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Request stdout/stderr redirection. Always implied by captured runs and
    /// rejected by visible runs.
    pub redirect_output: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            redirect_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn redirect_output(mut self) -> Self {
        self.redirect_output = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the command headless and returns its combined output.
    ///
    /// Output is the trimmed stdout, or, when anything was written to stderr,
    /// `"Error executing command:\n{stderr}\nOutput:\n{stdout}"`.
    async fn run_captured(&self, invocation: &Invocation) -> Result<String, ProcessError>;

    /// Runs the command in a new terminal window and waits for it to exit.
    ///
    /// The child must not read this process's stdin or write to its stdout.
    async fn run_visible(&self, invocation: &Invocation) -> Result<(), ProcessError>;
}
