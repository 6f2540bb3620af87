// CLI module for ecochat
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ecochat - carbon-aware chat front-end with a persistent response cache
#[derive(Parser, Debug)]
#[command(name = "ecochat", version, about, long_about = None)]
pub struct Args {
    /// Config file (defaults to ~/.ecochat/config.toml when present)
    #[arg(long, global = true, env = "ECOCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Send a single message and print the reply with its carbon annotation
    Chat {
        /// The user message
        message: String,

        /// System message (defaults to the configured one)
        #[arg(long)]
        system: Option<String>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long)]
        top_p: Option<f64>,
    },

    /// Summarize the emissions log
    Report {
        /// Print the summary and time series as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_subcommand() {
        let args = Args::try_parse_from(["ecochat"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_chat_arguments() {
        let args = Args::try_parse_from([
            "ecochat",
            "chat",
            "What is climate change?",
            "--max-tokens",
            "256",
            "--config",
            "eco.toml",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("eco.toml")));
        match args.command {
            Some(Command::Chat { message, max_tokens, temperature, .. }) => {
                assert_eq!(message, "What is climate change?");
                assert_eq!(max_tokens, Some(256));
                assert_eq!(temperature, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
