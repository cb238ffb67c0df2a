//! Configuration management.
//!
//! The whole storage surface is one decision: if a database URL is present
//! the client-server engine is used, otherwise the embedded `SQLite` file.
//! Values are layered defaults → optional TOML file → environment.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the PostgreSQL connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding the `SQLite` file path.
pub const DB_PATH_ENV: &str = "EGRESADOS_DB_PATH";
/// Environment variable overriding the `SQLite` busy timeout, in seconds.
pub const BUSY_TIMEOUT_ENV: &str = "EGRESADOS_BUSY_TIMEOUT_SECS";

/// Default file name of the embedded database.
pub const DEFAULT_DB_FILENAME: &str = "egresados.db";
/// Default lock wait for the embedded engine.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connect timeout for the client-server engine.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// PostgreSQL connection string. Selects the client-server engine when set.
    pub database_url: Option<SecretString>,
    /// Path to the `SQLite` database file.
    pub sqlite_path: PathBuf,
    /// How long `SQLite` waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// How long PostgreSQL connection establishment may take.
    pub connect_timeout: Duration,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// `SQLite` database path.
    pub sqlite_path: Option<String>,
    /// `SQLite` busy timeout in seconds.
    pub busy_timeout_secs: Option<u64>,
    /// PostgreSQL connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            sqlite_path: PathBuf::from(DEFAULT_DB_FILENAME),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl StorageConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// environment override is malformed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file).with_env_overrides()
    }

    /// Loads configuration from the default location.
    ///
    /// Uses `<config dir>/egresados/config.toml` when it exists. Otherwise the
    /// `SQLite` file defaults to `<data dir>/egresados/egresados.db`. The
    /// environment is applied last in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error if a found config file is invalid or an environment
    /// override is malformed.
    pub fn load_default() -> Result<Self> {
        if let Some(dirs) = project_dirs() {
            let config_path = dirs.config_dir().join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Self::default()
            .with_sqlite_path(default_sqlite_path())
            .with_env_overrides()
    }

    /// Converts a `ConfigFile` to `StorageConfig`.
    ///
    /// Fields the file leaves out keep their defaults, including the
    /// data-dir location of the `SQLite` file.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default().with_sqlite_path(default_sqlite_path());

        if let Some(url) = file.database_url {
            config.database_url = non_empty_secret(url);
        }
        if let Some(path) = file.sqlite_path {
            config.sqlite_path = PathBuf::from(path);
        }
        if let Some(secs) = file.busy_timeout_secs {
            config.busy_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Applies `DATABASE_URL`, `EGRESADOS_DB_PATH` and
    /// `EGRESADOS_BUSY_TIMEOUT_SECS` on top of the current values.
    ///
    /// An empty `DATABASE_URL` counts as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the busy timeout is not a whole
    /// number of seconds.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            self.database_url = non_empty_secret(url);
        }
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                self.sqlite_path = PathBuf::from(path);
            }
        }
        if let Ok(secs) = std::env::var(BUSY_TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::InvalidInput(format!(
                    "{BUSY_TIMEOUT_ENV} must be whole seconds, got '{secs}'"
                ))
            })?;
            self.busy_timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    /// Sets the PostgreSQL connection string.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = non_empty_secret(url.into());
        self
    }

    /// Sets the `SQLite` database path.
    #[must_use]
    pub fn with_sqlite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite_path = path.into();
        self
    }

    /// Sets the `SQLite` busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Returns true when the client-server engine is selected.
    #[must_use]
    pub const fn uses_client_server(&self) -> bool {
        self.database_url.is_some()
    }

    /// Returns the connection string, if configured.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_ref().map(|url| url.expose_secret())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "egresados")
}

/// `<data dir>/egresados.db`, or a relative `egresados.db` without a home directory.
#[must_use]
pub fn default_sqlite_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(DEFAULT_DB_FILENAME),
        |dirs| dirs.data_dir().join(DEFAULT_DB_FILENAME),
    )
}

fn non_empty_secret(value: String) -> Option<SecretString> {
    if value.trim().is_empty() {
        None
    } else {
        Some(SecretString::from(value))
    }
}
