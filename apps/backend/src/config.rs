//! Service configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::exam::ExamSettings;
use crate::services::pool_cache::PoolSettings;
use crate::store::Lifetime;

/// Durable store file inside the data directory.
pub const DATABASE_FILE: &str = "tutor.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("no data directory available; set DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Settings handed to the services.
#[derive(Debug, Clone, Default)]
pub struct TutorSettings {
    pub pool: PoolSettings,
    pub exam: ExamSettings,
    /// Hour (0-23) at which a new study day begins.
    pub daily_reset_hour: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub provider: ProviderConfig,
    pub tutor: TutorSettings,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = match var("DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("hsk-tutor"),
        };

        let provider = ProviderConfig {
            url: var("PROVIDER_URL").ok_or(ConfigError::Missing("PROVIDER_URL"))?,
            api_key: var("PROVIDER_API_KEY"),
            timeout: Duration::from_secs(parse_or(&var, "PROVIDER_TIMEOUT_SECS", 60)?),
        };

        let pool = PoolSettings {
            pool_size: positive(parse_or(&var, "POOL_SIZE", 50)?, "POOL_SIZE")?,
            page_size: positive(parse_or(&var, "PAGE_SIZE", 10)?, "PAGE_SIZE")?,
            lifetime: parse_or(&var, "POOL_LIFETIME", Lifetime::Durable)?,
        };

        let exam = ExamSettings {
            question_count: positive(parse_or(&var, "EXAM_QUESTION_COUNT", 40)?, "EXAM_QUESTION_COUNT")?,
            duration_secs: parse_or(&var, "EXAM_DURATION_SECS", 3000)?,
            tick: Duration::from_millis(parse_or(&var, "EXAM_TICK_MILLIS", 1000)?),
        };
        if exam.duration_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "EXAM_DURATION_SECS",
                value: "0".to_string(),
            });
        }
        if exam.tick.is_zero() {
            return Err(ConfigError::Invalid {
                name: "EXAM_TICK_MILLIS",
                value: "0".to_string(),
            });
        }

        let daily_reset_hour: u32 = parse_or(&var, "DAILY_RESET_HOUR", 0)?;
        if daily_reset_hour > 23 {
            return Err(ConfigError::Invalid {
                name: "DAILY_RESET_HOUR",
                value: daily_reset_hour.to_string(),
            });
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3000)?,
            data_dir,
            provider,
            tutor: TutorSettings {
                pool,
                exam,
                daily_reset_hour,
            },
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn positive(value: usize, name: &'static str) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    } else {
        Ok(value)
    }
}
