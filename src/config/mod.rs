mod env;
pub mod settings;

use crate::error::Error;
use config::Config;
use lazy_static::lazy_static;
use serde::Deserialize;

use self::env::ENV;

const CONFIG_FILE_PATH: &str = "./config/main";
const CONFIG_FILE_PATH_PREFIX: &str = "./config/";

lazy_static! {
    pub static ref C: ScConfig = parse().unwrap();
}

#[derive(Clone, Deserialize, Default)]
pub struct ScConfig {
    #[serde(default)]
    pub db: ConfigDb,
    #[serde(default)]
    pub fetch: ConfigFetch,
    #[serde(default)]
    pub sources: ConfigSources,
}

/// Where the static universe CSV exports live.
#[derive(Clone, Deserialize)]
pub struct ConfigDb {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Clone, Deserialize)]
pub struct ConfigFetch {
    /// Per-request timeout on upstream HTTP calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Auto-refresh period. Clamped to 10..=600 by the worker.
    #[serde(default = "default_auto_refresh_secs")]
    pub auto_refresh_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct ConfigSources {
    /// Persisted map source configuration (JSON key-value store).
    #[serde(default = "default_sources_file")]
    pub file: String,
}

fn default_data_dir() -> String {
    "./resources/database".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_auto_refresh_secs() -> u64 {
    30
}

fn default_sources_file() -> String {
    "./config/sources.json".into()
}

impl Default for ConfigDb {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ConfigFetch {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            auto_refresh_secs: default_auto_refresh_secs(),
        }
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            file: default_sources_file(),
        }
    }
}

/// Fetch and parse runtime ENV.
pub fn app_env() -> ENV {
    if cfg!(test) {
        return ENV::Testing;
    }

    std::env::var("SHORTCIRCUIT_ENV")
        .unwrap_or_else(|_| "development".into())
        .into()
}

/// Parse config from local file or ENV.
pub fn parse() -> Result<ScConfig, Error> {
    let s = Config::builder()
        // Default
        .add_source(config::File::with_name(CONFIG_FILE_PATH).required(false))
        // app-env-based config
        .add_source(
            config::File::with_name(&format!("{}{}.toml", CONFIG_FILE_PATH_PREFIX, app_env()))
                .required(false),
        )
        // runtime-ENV-based config
        .add_source(
            config::Environment::with_prefix("SC")
                .separator("__")
                .ignore_empty(true),
        )
        .build()?;

    s.try_deserialize().map_err(|e| e.into())
}
