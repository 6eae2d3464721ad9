//! CLI module for Delve.

pub mod commands;
mod output;
mod page;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Query used by `delve run` when none is given.
pub const DEFAULT_QUERY: &str = "Tell me about spacex";

/// Delve - a research assistant over paper, encyclopedia and web search
///
/// Routes a hosted language model through arXiv, Wikipedia and Tavily,
/// then drafts a concise answer from what the tools returned.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// API key for the hosted model provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub groq_api_key: Option<String>,

    /// API key for the web search provider
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, global = true)]
    pub tavily_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research one query and print every message of the conversation
    Run {
        /// The question to research
        #[arg(default_value = DEFAULT_QUERY)]
        query: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,

        /// Keep reasoning traces in the output
        #[arg(long)]
        raw: bool,
    },

    /// Start the web UI
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (keys redacted)
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults_to_spacex_query() {
        let cli = Cli::try_parse_from(["delve", "run"]).unwrap();
        match cli.command {
            Commands::Run { query, json, raw, .. } => {
                assert_eq!(query, DEFAULT_QUERY);
                assert!(!json);
                assert!(!raw);
            }
            other => panic!("Expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["delve", "serve", "--port", "9000", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
