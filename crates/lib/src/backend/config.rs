//! Backend configuration and layered resolution.
//!
//! A [`BackendConfig`] is the record a host hands to the provider. Before
//! connecting it is resolved exactly once into a [`ResolvedConfig`]:
//!
//! 1. start from the discrete fields of the record
//! 2. if `external_config` names a file, overlay every key present in that file
//! 3. validate the result and normalize driver, dialect and URL
//!
//! Resolution never mutates the original record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::Result;

/// Pool size used when the configuration does not set one.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Storage driver selected by the `driver` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// In-memory directory, optionally persisted to a JSON file
    Memory,
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// Any SQL database supported by the pool; the engine is picked from the URL
    Any,
}

impl Driver {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Memory => "memory",
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
            Driver::Any => "any",
        }
    }

    /// Dialect implied by the driver alone, if any.
    pub fn default_dialect(&self) -> Option<Dialect> {
        match self {
            Driver::Sqlite => Some(Dialect::Sqlite),
            Driver::Postgres => Some(Dialect::Postgres),
            Driver::Memory | Driver::Any => None,
        }
    }
}

impl FromStr for Driver {
    type Err = BackendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "inmemory" => Ok(Driver::Memory),
            "sqlite" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "any" => Ok(Driver::Any),
            _ => Err(BackendError::UnsupportedDriver {
                driver: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL flavor used for statements whose syntax differs between engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Infer a dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Dialect::Sqlite),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            _ => None,
        }
    }
}

impl FromStr for Dialect {
    type Err = BackendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(BackendError::InvalidConfig {
                reason: format!("unknown dialect '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => f.write_str("sqlite"),
            Dialect::Postgres => f.write_str("postgres"),
        }
    }
}

/// Backend configuration record as supplied by the host.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Driver name: `memory`, `sqlite`, `postgres` or `any`
    pub driver: String,

    /// Connection URL. For `memory`: `memory:` or `file:<path>`
    #[serde(alias = "connection_url")]
    pub url: String,

    /// Connection user name (may be empty for drivers without credentials)
    #[serde(default)]
    pub username: String,

    /// Connection password (may be empty for drivers without credentials)
    #[serde(default)]
    pub password: String,

    /// Optional SQL dialect override
    #[serde(default)]
    pub dialect: Option<String>,

    /// Optional maximum pool size
    #[serde(default)]
    pub pool_size: Option<u32>,

    /// Optional JSON file whose keys override the fields above
    #[serde(default)]
    pub external_config: Option<PathBuf>,

    /// Initialize the backend on a background task
    #[serde(default)]
    pub parallel_init: bool,
}

// Manual impl so the password never reaches logs.
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("driver", &self.driver)
            .field("url", &redact_url(&self.url))
            .field("username", &self.username)
            .field("password", &"***")
            .field("dialect", &self.dialect)
            .field("pool_size", &self.pool_size)
            .field("external_config", &self.external_config)
            .field("parallel_init", &self.parallel_init)
            .finish()
    }
}

/// Keys an external configuration file may override.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    driver: Option<String>,
    #[serde(alias = "connection_url")]
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    dialect: Option<String>,
    pool_size: Option<u32>,
}

impl BackendConfig {
    /// Create a configuration with the required fields and defaults for the rest.
    pub fn new(
        driver: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            driver: driver.into(),
            url: url.into(),
            username: username.into(),
            password: password.into(),
            dialect: None,
            pool_size: None,
            external_config: None,
            parallel_init: false,
        }
    }

    /// Configuration for an ephemeral in-memory directory.
    pub fn in_memory() -> Self {
        Self::new("memory", "memory:", "", "")
    }

    /// Builder: set the dialect override.
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    /// Builder: set the pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Builder: layer an external configuration file on top.
    pub fn with_external_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.external_config = Some(path.into());
        self
    }

    /// Builder: initialize on a background task.
    pub fn with_parallel_init(mut self, parallel: bool) -> Self {
        self.parallel_init = parallel;
        self
    }

    /// Load a configuration record from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BackendError::ConfigFile {
                path: path.to_path_buf(),
                source,
            })?;
        let config = serde_json::from_str(&data).map_err(|source| BackendError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Apply external overrides, validate and normalize.
    pub async fn resolve(&self) -> Result<ResolvedConfig> {
        let mut layered = self.clone();

        if let Some(path) = &self.external_config {
            let data = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| BackendError::ConfigFile {
                    path: path.clone(),
                    source,
                })?;
            let overrides: ConfigOverrides =
                serde_json::from_str(&data).map_err(|source| BackendError::ConfigParse {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), "Applying external backend configuration");
            layered.apply(overrides);
        }

        layered.validate()
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(driver) = overrides.driver {
            self.driver = driver;
        }
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if overrides.dialect.is_some() {
            self.dialect = overrides.dialect;
        }
        if overrides.pool_size.is_some() {
            self.pool_size = overrides.pool_size;
        }
    }

    fn validate(self) -> Result<ResolvedConfig> {
        if self.driver.trim().is_empty() {
            return Err(invalid("driver is empty"));
        }
        if self.url.trim().is_empty() {
            return Err(invalid("url is empty"));
        }
        let driver: Driver = self.driver.parse()?;

        let pool_size = self.pool_size.unwrap_or(DEFAULT_POOL_SIZE);
        if pool_size == 0 {
            return Err(invalid("pool_size must be > 0"));
        }

        let requested = self.dialect.as_deref().map(str::parse::<Dialect>).transpose()?;
        let dialect = match driver {
            Driver::Memory => {
                if requested.is_some() {
                    return Err(invalid("dialect does not apply to the memory driver"));
                }
                if self.url != "memory:" && !self.url.starts_with("file:") {
                    return Err(invalid("memory driver expects 'memory:' or 'file:<path>'"));
                }
                None
            }
            Driver::Sqlite | Driver::Postgres => {
                let implied = driver.default_dialect();
                if let Some(requested) = requested
                    && Some(requested) != implied
                {
                    return Err(invalid(format!(
                        "dialect {requested} does not match driver {driver}"
                    )));
                }
                if Dialect::from_url(&self.url) != implied {
                    return Err(invalid(format!(
                        "url scheme does not match driver {driver}"
                    )));
                }
                implied
            }
            Driver::Any => match requested.or_else(|| Dialect::from_url(&self.url)) {
                Some(dialect) => Some(dialect),
                None => {
                    return Err(invalid(
                        "cannot infer a dialect from the url; set 'dialect'",
                    ));
                }
            },
        };

        let url = if dialect == Some(Dialect::Postgres) {
            inject_credentials(&self.url, &self.username, &self.password)?
        } else {
            self.url
        };

        Ok(ResolvedConfig {
            driver,
            dialect,
            url,
            username: self.username,
            pool_size,
            parallel_init: self.parallel_init,
        })
    }
}

/// A validated configuration ready for connecting.
#[derive(Clone)]
pub struct ResolvedConfig {
    /// Selected driver
    pub driver: Driver,
    /// SQL dialect; `None` for the memory driver
    pub dialect: Option<Dialect>,
    /// Connection URL, with credentials injected where the dialect needs them
    pub url: String,
    /// Connection user name
    pub username: String,
    /// Maximum pool size
    pub pool_size: u32,
    /// Initialize on a background task
    pub parallel_init: bool,
}

impl ResolvedConfig {
    /// Connection URL with credentials masked, safe for logs.
    pub fn display_url(&self) -> String {
        redact_url(&self.url)
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("driver", &self.driver)
            .field("dialect", &self.dialect)
            .field("url", &self.display_url())
            .field("username", &self.username)
            .field("pool_size", &self.pool_size)
            .field("parallel_init", &self.parallel_init)
            .finish()
    }
}

fn invalid(reason: impl Into<String>) -> crate::Error {
    BackendError::InvalidConfig {
        reason: reason.into(),
    }
    .into()
}

/// Put `username`/`password` into `url` unless it already carries them.
fn inject_credentials(url: &str, username: &str, password: &str) -> Result<String> {
    let mut parsed = url::Url::parse(url).map_err(|e| invalid(format!("invalid url: {e}")))?;
    if parsed.username().is_empty() && !username.is_empty() {
        parsed
            .set_username(username)
            .map_err(|_| invalid("url cannot carry a username"))?;
    }
    if parsed.password().is_none() && !password.is_empty() {
        parsed
            .set_password(Some(password))
            .map_err(|_| invalid("url cannot carry a password"))?;
    }
    Ok(parsed.to_string())
}

/// Redact credentials from a connection URL for safe logging.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.has_host() => {
            let mut redacted = parsed.clone();
            if !parsed.username().is_empty() {
                let _ = redacted.set_username("***");
            }
            if parsed.password().is_some() {
                let _ = redacted.set_password(Some("***"));
            }
            redacted.to_string()
        }
        Ok(_) => url.to_string(),
        Err(_) => "<unparsable-url>".to_string(),
    }
}
