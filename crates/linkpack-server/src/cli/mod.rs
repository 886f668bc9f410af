//! CLI for the linkpack archive server.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkpack_core::config::{self, LinkpackConfig};
use std::path::{Path, PathBuf};

use commands::{run_print_config, run_serve};

/// Top-level CLI for the linkpack archive server.
#[derive(Debug, Parser)]
#[command(name = "linkpack")]
#[command(about = "linkpack: collect links into tasks and serve them as ZIP archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP server until interrupted.
    Serve {
        /// Config file (default: ~/.config/linkpack/config.toml).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Listen on this port instead of the configured one.
        #[arg(long)]
        port: Option<u16>,
        /// Log to stderr instead of the state-dir log file.
        #[arg(long)]
        log_stderr: bool,
    },

    /// Print the effective configuration as TOML.
    PrintConfig {
        /// Config file (default: ~/.config/linkpack/config.toml).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// True when logging should go straight to stderr.
    pub fn log_stderr(&self) -> bool {
        match &self.command {
            CliCommand::Serve { log_stderr, .. } => *log_stderr,
            CliCommand::PrintConfig { .. } => true,
        }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Serve { config, port, .. } => {
                let mut cfg = load_config(config.as_deref())?;
                if let Some(port) = port {
                    cfg.port = port;
                }
                tracing::debug!("loaded config: {:?}", cfg);
                run_serve(cfg).await?;
            }
            CliCommand::PrintConfig { config } => {
                let cfg = load_config(config.as_deref())?;
                run_print_config(&cfg)?;
            }
        }
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<LinkpackConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_default(),
    }
}

#[cfg(test)]
mod tests;
