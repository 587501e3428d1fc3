//! Configuration loading.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. Global file: `$XDG_CONFIG_HOME/daily-byte/config.toml`
//! 3. Project file: `./daily-byte.toml`
//! 4. Explicit `--config <path>`
//! 5. Environment variables prefixed `DAILY_BYTE_` (nested keys use `__`,
//!    e.g. `DAILY_BYTE_ENDPOINTS__JOKE`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROJECT_FILE: &str = "daily-byte.toml";
const APP_DIR: &str = "daily-byte";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Provider endpoint URLs.  Only tests and self-hosted mirrors need to
/// change these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub quote_primary: String,
    pub quote_secondary: String,
    pub joke: String,
    pub trivia: String,
    pub history: String,
    pub random_word: String,
    pub dictionary: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            quote_primary: "https://api.quotable.io/quotes/random".into(),
            quote_secondary: "https://zenquotes.io/api/quotes".into(),
            joke: "https://v2.jokeapi.dev/joke/Programming,Miscellaneous,Pun".into(),
            trivia: "http://numbersapi.com/random/trivia".into(),
            history: "https://history.muffinlabs.com/date".into(),
            random_word: "https://random-word-api.herokuapp.com/word".into(),
            dictionary: "https://api.dictionaryapi.dev/api/v2/entries/en".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Items fetched and rotated per category.
    pub items_per_category: usize,
    /// How long a fetched content set stays fresh.
    pub cache_ttl_secs: u64,
    /// Interval between rotation ticks.
    pub rotation_interval_secs: u64,
    /// How often the service checks whether the cache has gone stale.
    pub refresh_check_secs: u64,
    /// Upper bound on any single provider request.
    pub request_timeout_secs: u64,
    /// Trivia needs this many live answers before any are used.
    pub min_trivia_successes: usize,
    /// Persist the content cache across runs.
    pub persist: bool,
    /// Directory for the persisted cache and log file.
    pub cache_dir: Option<PathBuf>,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            items_per_category: 5,
            cache_ttl_secs: 6 * 60 * 60,
            rotation_interval_secs: 60,
            refresh_check_secs: 5 * 60,
            request_timeout_secs: 10,
            min_trivia_successes: 3,
            persist: true,
            cache_dir: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources and validate it.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }
        if Path::new(PROJECT_FILE).exists() {
            figment = figment.merge(Toml::file(PROJECT_FILE));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("DAILY_BYTE_").split("__"));

        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_category == 0 {
            return Err(ConfigError::Invalid("items_per_category must be at least 1".into()));
        }
        for (name, value) in [
            ("cache_ttl_secs", self.cache_ttl_secs),
            ("rotation_interval_secs", self.rotation_interval_secs),
            ("refresh_check_secs", self.refresh_check_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    /// Resolved cache directory: explicit setting, else the platform cache
    /// dir, else `./.daily-byte`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".daily-byte"))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_check_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.items_per_category, 5);
        assert_eq!(config.cache_ttl(), Duration::from_secs(21_600));
        assert_eq!(config.rotation_interval(), Duration::from_secs(60));
        assert_eq!(config.min_trivia_successes, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "items_per_category = 3\nrotation_interval_secs = 15\n\n[endpoints]\njoke = \"http://localhost/joke\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.items_per_category, 3);
        assert_eq!(config.rotation_interval_secs, 15);
        assert_eq!(config.endpoints.joke, "http://localhost/joke");
        assert_eq!(config.endpoints.trivia, Endpoints::default().trivia);
    }

    #[test]
    fn zero_items_is_rejected() {
        let config = Config {
            items_per_category: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = Config {
            rotation_interval_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rotation_interval_secs"));
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/tmp/db")),
            ..Config::default()
        };
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/db"));
    }
}
