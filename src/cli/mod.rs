//! CLI module for curator.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version display
//! - Streaming a collection as JSON lines
//!
//! # Usage
//!
//! ```ignore
//! use curator::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! run_cli_command(command).await?;
//! ```

pub mod args;
pub mod load;
pub mod version;

pub use args::{parse_args, CliCommand, LoadArgs, USAGE};
pub use load::{handle_load_command, stream_collection};
pub use version::{handle_version_command, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::LoaderConfig;

/// Run a parsed CLI command.
///
/// Configuration is read from the environment only for commands that
/// load something, so `--version` and `--help` work with a broken setup.
pub async fn run_cli_command(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Version => {
            handle_version_command();
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Invalid(reason) => Err(eyre!("{}\n\n{}", reason, USAGE)),
        CliCommand::Load(args) => {
            let config = LoaderConfig::from_env()?;
            handle_load_command(args, config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_command_reports_usage() {
        let err = run_cli_command(CliCommand::Invalid("unknown option '--x'".to_string()))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown option"));
        assert!(message.contains("Usage: curator"));
    }

    #[tokio::test]
    async fn test_help_and_version_succeed() {
        assert!(run_cli_command(CliCommand::Help).await.is_ok());
        assert!(run_cli_command(CliCommand::Version).await.is_ok());
    }
}
