pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{ActionArg, BuildArgs, CliArgs, Commands, ServeArgs};
pub use output::{OutputFormat, OutputFormatter};
