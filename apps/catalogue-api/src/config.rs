//! Configuration for Catalogue API

use core_config::{
    app_info, env_bool, env_optional, env_or_default, env_parse, server::ServerConfig, AppInfo,
    ConfigError, FromEnv,
};
use database::postgres::PostgresConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Where socks are read from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    /// Seed file loaded into memory at startup
    #[default]
    Memory,
    Postgres,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreBackend,
    /// Present only for the postgres backend
    pub postgres: Option<PostgresConfig>,
    /// JSON seed; the bundled catalogue is used when unset
    pub seed_file: Option<PathBuf>,
    pub images_path: PathBuf,
    /// Per-request deadline, `None` when `REQUEST_TIMEOUT_SECS=0`
    pub request_timeout: Option<Duration>,
    pub metrics_enabled: bool,
    pub cors_origins: Option<String>,
}

impl Config {
    /// Environment variables:
    /// - `STORE_BACKEND` (`memory` | `postgres`, default: memory)
    /// - `CATALOGUE_SEED_FILE` (optional)
    /// - `IMAGES_PATH` (default: ./images/)
    /// - `REQUEST_TIMEOUT_SECS` (default: 10, 0 disables)
    /// - `METRICS_ENABLED` (default: true)
    /// - `CORS_ALLOWED_ORIGIN` (comma separated; required when `APP_ENV=production`)
    ///
    /// plus `APP_ENV`, `HOST`, `PORT`, `SHUTDOWN_TIMEOUT_SECS` and, for the
    /// postgres backend, `DATABASE_URL` and the `DB_*` pool settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;

        let store = match env_optional("STORE_BACKEND") {
            Some(raw) => StoreBackend::from_str(&raw).map_err(|_| ConfigError::ParseError {
                key: "STORE_BACKEND".to_string(),
                details: format!("'{}' is not one of memory, postgres", raw),
            })?,
            None => StoreBackend::default(),
        };

        let postgres = match store {
            StoreBackend::Postgres => Some(PostgresConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        let request_timeout = match env_parse::<u64>("REQUEST_TIMEOUT_SECS", 10)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            postgres,
            seed_file: env_optional("CATALOGUE_SEED_FILE").map(PathBuf::from),
            images_path: PathBuf::from(env_or_default("IMAGES_PATH", "./images/")),
            request_timeout,
            metrics_enabled: env_bool("METRICS_ENABLED", true)?,
            cors_origins: env_optional("CORS_ALLOWED_ORIGIN"),
        })
    }
}
