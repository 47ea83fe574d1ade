use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("Invalid {key} value: {message}")]
pub struct ConfigError {
    key: String,
    message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    MySql,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreKind::MySql),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store {other:?}, expected mysql or memory")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
    pub idle_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub store: StoreKind,
    pub mysql: MySqlConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            store: try_load("SCHOOLS_STORE", "mysql")?,
            mysql: MySqlConfig {
                host: try_load("MYSQL_HOST", "localhost")?,
                port: try_load("MYSQL_PORT", "3306")?,
                user: try_load("MYSQL_USER", "root")?,
                password: read_secret("MYSQL_PASSWORD"),
                database: try_load("MYSQL_DATABASE", "test")?,
                pool_size: try_load("MYSQL_POOL_SIZE", "10")?,
                idle_timeout: Duration::from_secs(try_load("MYSQL_IDLE_TIMEOUT_SECS", "60")?),
            },
        })
    }

    /// In-process store on an OS-assigned port.
    pub fn memory() -> Self {
        Self {
            port: 0,
            store: StoreKind::Memory,
            mysql: MySqlConfig {
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: String::new(),
                database: "test".to_string(),
                pool_size: 10,
                idle_timeout: Duration::from_secs(60),
            },
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(key, var(key), default)
}

fn parse<T: FromStr>(key: &str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");

            ConfigError {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
}

/// Docker secret first, then the plain environment variable.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|e| {
            info!("Secret {secret_name} not readable ({e}), falling back to environment");

            var(secret_name).unwrap_or_else(|| {
                warn!("{secret_name} not set, using an empty value");
                String::new()
            })
        })
}
