//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tf-local - run local commands and manage local files from an
/// infrastructure-as-code engine
#[derive(Parser, Debug)]
#[command(name = "tf-local")]
#[command(about = "Provider for managing local files and executing local commands")]
#[command(version)]
pub struct Cli {
    /// Provider configuration file (JSON), applied before any request
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "debug", "tf_local=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the provider, resource and data source schemas as JSON
    Schema,
    /// Handle a single request and print the response
    Invoke {
        /// Request file (JSON); reads stdin when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,
    },
    /// Answer newline-delimited JSON requests from stdin until EOF
    Serve,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tf-local", "serve", "--config", "p.json", "--log-level", "debug"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Serve));
        assert_eq!(cli.config, Some(PathBuf::from("p.json")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invoke_request_flag() {
        let cli = Cli::try_parse_from(["tf-local", "invoke", "-r", "req.json"]).unwrap();
        match cli.command {
            Commands::Invoke { request } => assert_eq!(request, Some(PathBuf::from("req.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tf-local"]).is_err());
    }
}
