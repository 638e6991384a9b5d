use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::config::LogTarget;

#[derive(Debug, Parser)]
#[command(name = "scribe")]
#[command(about = "Upload page images, extract their text and assemble a document")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload images, extract every page and optionally build the document.
    Run(RunArgs),
    /// Print the effective configuration.
    Config {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Page images, in reading order.
    #[arg(value_name = "IMAGE", required = true)]
    pub files: Vec<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    /// Extraction language code, e.g. `vie` or `eng`.
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,
    /// Build and download the assembled document once extraction settles.
    #[arg(long)]
    pub assemble: bool,
    /// Give up if the session has not settled after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
    #[arg(long, value_enum)]
    pub log: Option<LogTarget>,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_at_least_one_image() {
        assert!(Cli::try_parse_from(["scribe", "run"]).is_err());
    }

    #[test]
    fn run_collects_images_in_order() {
        let cli = Cli::try_parse_from(["scribe", "run", "--assemble", "b.png", "a.png"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.assemble);
                assert_eq!(args.files, vec![PathBuf::from("b.png"), PathBuf::from("a.png")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
