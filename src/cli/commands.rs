use crate::request::Action;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build-and-run dispatcher for uploaded C#, C++ and Arduino projects
#[derive(Parser, Debug)]
#[command(
    name = "codeforge",
    about = "Build-and-run dispatcher for uploaded C#, C++ and Arduino projects",
    version,
    author,
    long_about = "codeforge unpacks a project archive into a throwaway workspace, builds it \
                  with dotnet, CMake or arduino-cli, optionally launches the result in a \
                  visible terminal, and always removes the workspace afterwards."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build (and optionally run) a project",
        long_about = "Builds a project from a .zip archive or a directory. Directories are \
                      packed in memory first, so the source tree is never modified.\n\n\
                      Examples:\n  \
                      codeforge build app.zip --env csharp\n  \
                      codeforge build ./hello --env cpp --action build-and-run\n  \
                      codeforge build ./blink --env arduino --board arduino:avr:uno --port COM3"
    )]
    Build(BuildArgs),

    #[command(
        about = "Serve JSON requests over stdin/stdout",
        long_about = "Reads one JSON request per line from stdin and writes one JSON reply per \
                      line to stdout. Requests use the fields action, environment, payload \
                      (base64 zip) and arduinoConfig.\n\n\
                      Examples:\n  \
                      codeforge serve < requests.jsonl"
    )]
    Serve(ServeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "PATH", help = "Project .zip archive or directory")]
    pub project_path: PathBuf,

    #[arg(
        short = 'e',
        long = "env",
        value_name = "ENV",
        help = "Target environment (csharp, cpp, arduino, esp32)"
    )]
    pub environment: String,

    #[arg(
        short = 'a',
        long,
        value_enum,
        default_value = "build",
        help = "What to do after unpacking"
    )]
    pub action: ActionArg,

    #[arg(long, value_name = "FQBN", help = "Board name for arduino/esp32 targets")]
    pub board: Option<String>,

    #[arg(long, value_name = "PORT", help = "Serial port for arduino/esp32 uploads")]
    pub port: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Workspace root (overrides CODEFORGE_WORKSPACE_ROOT)"
    )]
    pub workspace_root: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    Build,
    Run,
    BuildAndRun,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Build => Action::Build,
            ActionArg::Run => Action::Run,
            ActionArg::BuildAndRun => Action::BuildAndRun,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_build_args() {
        let args = CliArgs::parse_from(["codeforge", "build", "app.zip", "--env", "csharp"]);
        match args.command {
            Commands::Build(build_args) => {
                assert_eq!(build_args.project_path, PathBuf::from("app.zip"));
                assert_eq!(build_args.environment, "csharp");
                assert_eq!(build_args.action, ActionArg::Build);
                assert_eq!(build_args.format, OutputFormatArg::Human);
                assert!(build_args.board.is_none());
                assert!(build_args.port.is_none());
                assert!(build_args.output.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_with_options() {
        let args = CliArgs::parse_from([
            "codeforge",
            "build",
            "./blink",
            "--env",
            "arduino",
            "--action",
            "build-and-run",
            "--board",
            "arduino:avr:uno",
            "--port",
            "COM3",
            "--format",
            "json",
            "--output",
            "report.json",
        ]);

        match args.command {
            Commands::Build(build_args) => {
                assert_eq!(build_args.action, ActionArg::BuildAndRun);
                assert_eq!(Action::from(build_args.action), Action::BuildAndRun);
                assert_eq!(build_args.board.as_deref(), Some("arduino:avr:uno"));
                assert_eq!(build_args.port.as_deref(), Some("COM3"));
                assert_eq!(build_args.format, OutputFormatArg::Json);
                assert_eq!(build_args.output, Some(PathBuf::from("report.json")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_requires_environment() {
        assert!(CliArgs::try_parse_from(["codeforge", "build", "app.zip"]).is_err());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result = CliArgs::try_parse_from([
            "codeforge", "build", "app.zip", "--env", "cpp", "--action", "deploy",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_command() {
        let args = CliArgs::parse_from(["codeforge", "serve"]);
        match args.command {
            Commands::Serve(serve_args) => assert!(serve_args.workspace_root.is_none()),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_global_verbose_flag() {
        let args = CliArgs::parse_from(["codeforge", "-v", "serve"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_quiet_flag() {
        let args = CliArgs::parse_from(["codeforge", "-q", "serve"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["codeforge", "-v", "-q", "serve"]).is_err());
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["codeforge", "--log-level", "debug", "serve"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
