//! Configuration management for codeforge
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `CODEFORGE_WORKSPACE_ROOT`: Base directory for per-request workspaces - default:
//!   `tmp_projects` next to the running executable
//! - `CODEFORGE_LOG_LEVEL`: Logging level - default: "info"
//! - `CODEFORGE_DOTNET`: dotnet program - default: "dotnet"
//! - `CODEFORGE_CMAKE`: CMake program - default: "cmake"
//! - `CODEFORGE_ARDUINO_CLI`: arduino-cli program - default: "arduino-cli"
//! - `CODEFORGE_CPP_TARGET`: Executable name looked up first after a CMake build
//! - `CODEFORGE_TERMINAL`: Terminal emulator for visible runs, or `none` to run them
//!   without a window - default: `$TERMINAL`, then `x-terminal-emulator`
//!
//! # Example
//!
//! ```no_run
//! use codeforge::CodeforgeConfig;
//!
//! let config = CodeforgeConfig::default();
//! config.validate().expect("Invalid configuration");
//! let settings = config.toolchain_settings();
//! assert_eq!(settings.cmake_program, config.cmake_program);
//! ```

use crate::process::TerminalLauncher;
use crate::toolchain::ToolchainSettings;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_WORKSPACE_DIR: &str = "tmp_projects";
const DEFAULT_DOTNET: &str = "dotnet";
const DEFAULT_CMAKE: &str = "cmake";
const DEFAULT_ARDUINO_CLI: &str = "arduino-cli";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Workspace root {} exists and is not a directory", .0.display())]
    WorkspaceRootNotDirectory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeforgeConfig {
    /// Directory that receives one `proj_<hex>` workspace per request
    pub workspace_root: PathBuf,

    pub dotnet_program: String,

    pub cmake_program: String,

    pub arduino_cli_program: String,

    /// CMake executable name override
    pub cpp_target: Option<String>,

    /// Terminal emulator setting for visible runs; `None` means auto-detect
    pub terminal: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for CodeforgeConfig {
    /// Loads `CODEFORGE_*` environment variables, falling back to defaults for
    /// anything unset or blank.
    fn default() -> Self {
        let workspace_root = non_empty_var("CODEFORGE_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(default_workspace_root);

        let dotnet_program =
            non_empty_var("CODEFORGE_DOTNET").unwrap_or_else(|| DEFAULT_DOTNET.to_string());
        let cmake_program =
            non_empty_var("CODEFORGE_CMAKE").unwrap_or_else(|| DEFAULT_CMAKE.to_string());
        let arduino_cli_program = non_empty_var("CODEFORGE_ARDUINO_CLI")
            .unwrap_or_else(|| DEFAULT_ARDUINO_CLI.to_string());
        let cpp_target = non_empty_var("CODEFORGE_CPP_TARGET");
        let terminal = non_empty_var("CODEFORGE_TERMINAL");

        let log_level = non_empty_var("CODEFORGE_LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            workspace_root,
            dotnet_program,
            cmake_program,
            arduino_cli_program,
            cpp_target,
            terminal,
            log_level,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `<dir of the running executable>/tmp_projects`, or the current directory when
/// the executable path is unavailable.
pub fn default_workspace_root() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_WORKSPACE_DIR)
}

impl CodeforgeConfig {
    /// Validates the configuration
    ///
    /// Checks that:
    /// - Program names are not empty
    /// - Log level is valid
    /// - The workspace root is not an existing file
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("dotnet program", &self.dotnet_program),
            ("cmake program", &self.cmake_program),
            ("arduino-cli program", &self.arduino_cli_program),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.workspace_root.exists() && !self.workspace_root.is_dir() {
            return Err(ConfigError::WorkspaceRootNotDirectory(
                self.workspace_root.clone(),
            ));
        }

        Ok(())
    }

    /// Launcher for visible runs, resolved from the `terminal` setting.
    pub fn terminal_launcher(&self) -> Option<TerminalLauncher> {
        TerminalLauncher::from_setting(self.terminal.as_deref())
    }

    pub fn toolchain_settings(&self) -> ToolchainSettings {
        ToolchainSettings {
            dotnet_program: self.dotnet_program.clone(),
            cmake_program: self.cmake_program.clone(),
            arduino_cli_program: self.arduino_cli_program.clone(),
            cpp_target: self.cpp_target.clone(),
        }
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> std::collections::BTreeMap<String, String> {
        let mut map = std::collections::BTreeMap::new();

        map.insert(
            "workspace_root".to_string(),
            self.workspace_root.display().to_string(),
        );
        map.insert("dotnet_program".to_string(), self.dotnet_program.clone());
        map.insert("cmake_program".to_string(), self.cmake_program.clone());
        map.insert(
            "arduino_cli_program".to_string(),
            self.arduino_cli_program.clone(),
        );
        if let Some(ref target) = self.cpp_target {
            map.insert("cpp_target".to_string(), target.clone());
        }
        if let Some(ref terminal) = self.terminal {
            map.insert("terminal".to_string(), terminal.clone());
        }
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl From<&CodeforgeConfig> for ToolchainSettings {
    fn from(config: &CodeforgeConfig) -> Self {
        config.toolchain_settings()
    }
}

impl fmt::Display for CodeforgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Codeforge Configuration:")?;
        writeln!(f, "  Workspace Root: {}", self.workspace_root.display())?;
        writeln!(f, "  dotnet: {}", self.dotnet_program)?;
        writeln!(f, "  cmake: {}", self.cmake_program)?;
        writeln!(f, "  arduino-cli: {}", self.arduino_cli_program)?;
        if let Some(ref target) = self.cpp_target {
            writeln!(f, "  C++ Target: {}", target)?;
        }
        if let Some(ref terminal) = self.terminal {
            writeln!(f, "  Terminal: {}", terminal)?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
