//! Command-line front end: configuration, effect execution and the session driver.

pub(crate) mod cli;
pub(crate) mod config;
mod effects;
mod persistence;
mod session;

use std::ffi::OsString;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::engine_info;
use scribe_engine::EngineHandle;

use cli::{Cli, Commands, RunArgs};
use config::AppConfig;
use effects::EffectRunner;
use session::{Session, SessionSettings};

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Run(args) => run_session(args),
        Commands::Config { config } => {
            let config = AppConfig::discover(config.as_deref())?;
            println!("{}", config.to_ron()?);
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_session(args: RunArgs) -> Result<()> {
    let mut config = AppConfig::discover(args.config.as_deref())?;
    config.apply_overrides(&args);

    engine_logging::initialize(
        config.log_destination.into(),
        config.level_filter()?,
        &config.log_file,
    );
    engine_info!(
        "scribe {} backend={} lang={}",
        env!("CARGO_PKG_VERSION"),
        config.base_url,
        config.language
    );

    let engine = EngineHandle::new(config.engine_config()?).context("failed to start engine")?;
    let session = Session::new(
        EffectRunner::new(engine),
        SessionSettings {
            core: config.core_settings(),
            output_dir: config.output_dir.clone(),
            assemble: args.assemble,
            timeout: args.timeout_secs.map(Duration::from_secs),
        },
    );
    let summary = session.run(args.files)?;

    println!(
        "{} page(s): {} extracted, {} failed",
        summary.pages, summary.extracted, summary.failed
    );
    for path in &summary.transcripts {
        println!("{}", path.display());
    }
    if let Some(document) = &summary.document {
        println!("{document}");
    }
    Ok(())
}
