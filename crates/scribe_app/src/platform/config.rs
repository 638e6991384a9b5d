use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;
use scribe_core::{CoreSettings, DEFAULT_LANGUAGE};
use scribe_engine::{
    BackendSettings, EngineConfig, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_POLL_INTERVAL,
};
use serde::{Deserialize, Serialize};
use url::Url;

use super::cli::RunArgs;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "scribe.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub base_url: String,
    pub language: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_document_bytes: u64,
    pub output_dir: PathBuf,
    pub log_destination: LogTarget,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            output_dir: PathBuf::from("output"),
            log_destination: LogTarget::Terminal,
            log_level: "info".to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self> {
        ron::from_str(text).context("invalid configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Explicit path, then `./scribe.ron` if present, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(language) = &args.lang {
            self.language = language.clone();
        }
        if let Some(output_dir) = &args.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(poll_interval_ms) = args.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
        if let Some(target) = args.log {
            self.log_destination = target;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        match engine_logging::parse_level(&self.log_level) {
            Some(level) => Ok(level),
            None => bail!("unknown log level {:?}", self.log_level),
        }
    }

    pub fn core_settings(&self) -> CoreSettings {
        let language = self.language.trim();
        CoreSettings {
            default_language: if language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                language.to_string()
            },
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        let base_url = Url::parse(self.base_url.trim())
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("base_url {base_url} cannot carry a path");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        let backend = BackendSettings {
            base_url,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_document_bytes: self.max_document_bytes,
        };
        Ok(EngineConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..EngineConfig::new(backend, self.output_dir.clone())
        })
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .context("failed to serialize configuration")
    }
}
