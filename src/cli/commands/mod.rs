//! Command-line entry points.
//!
//! `Cli` parses arguments; each subcommand lives in its own module.

mod config_cmd;
mod convert;
mod extract;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "invoice-ocr")]
#[command(about = "Invoice OCR and structured extraction service")]
#[command(version)]
pub struct Cli {
    /// Read settings from this file instead of discovering one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logs for this crate and tower-http
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Scan raw args for `-v`, before clap runs, so logging can be set up first.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind: PORT, HOST, or HOST:PORT (defaults to the configured server address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Extract structured invoice JSON from a local image
    Extract {
        /// Image file to process
        image: PathBuf,
    },

    /// Check whether a local image looks like an invoice
    Classify {
        /// Image file to process
        image: PathBuf,
    },

    /// Render each page of a PDF to PNG
    Convert {
        /// PDF file to rasterize
        pdf: PathBuf,
        /// Directory to write page-N.png files into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Parse arguments, load configuration, and run the chosen command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&config, bind.as_deref()).await,
        Commands::Extract { image } => extract::cmd_extract(&config, &image).await,
        Commands::Classify { image } => extract::cmd_classify(&config, &image).await,
        Commands::Convert { pdf, out } => convert::cmd_convert(&config, &pdf, out.as_deref()).await,
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_with_global_flags() {
        let cli = Cli::try_parse_from([
            "invoice-ocr",
            "convert",
            "doc.pdf",
            "--out",
            "pages",
            "-v",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Convert { pdf, out } => {
                assert_eq!(pdf, PathBuf::from("doc.pdf"));
                assert_eq!(out, Some(PathBuf::from("pages")));
            }
            _ => panic!("expected convert"),
        }
    }
}
