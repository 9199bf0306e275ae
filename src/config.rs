//! Query defaults loaded from `config/config.toml` or the environment.
//!
//! ```toml
//! [models]
//! fetch_using = "get_next"   # or "get_next_element" (default)
//! sort_field = "SORT"
//! sort_order = "ASC"
//! ```
//!
//! Every key can be overridden with `IBLOCK_MODELS__MODELS__<KEY>`.

use crate::query::criteria::{FetchUsing, Sort, SortOrder};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "IBLOCK_MODELS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub fetch_using: FetchUsing,
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default)]
    pub sort_order: SortOrder,
}

fn default_sort_field() -> String {
    "SORT".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fetch_using: FetchUsing::default(),
            sort_field: default_sort_field(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ModelsConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from the TOML file at `path` (optional) layered with env vars.
    ///
    /// A missing `[models]` section yields the defaults. A file that exists
    /// but cannot be read is skipped with a warning.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = match Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
        {
            Ok(settings) => settings,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load config file {}, falling back to env: {err}",
                        path.display()
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        match settings.get::<ModelsConfig>("models") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "models configuration is invalid: {e}"
            ))),
        }
    }
}

/// Settings every new query starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub fetch_using: FetchUsing,
    pub sort: Sort,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self::from(&ModelsConfig::default())
    }
}

impl From<&ModelsConfig> for QueryDefaults {
    fn from(config: &ModelsConfig) -> Self {
        Self {
            fetch_using: config.fetch_using,
            sort: vec![(config.sort_field.clone(), config.sort_order)],
        }
    }
}
