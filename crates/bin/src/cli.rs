//! CLI argument definitions for the userdao binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use userdao::BackendConfig;

/// Operator console for the userdao user directory
#[derive(Parser, Debug)]
#[command(name = "userdao")]
#[command(about = "Inspect users and edit their permission and flag bits")]
#[command(version)]
pub struct Cli {
    /// JSON backend configuration file. Flags below override its fields.
    #[arg(short, long, env = "USERDAO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage driver: memory, sqlite, postgres or any
    #[arg(short, long, env = "USERDAO_DRIVER")]
    pub driver: Option<String>,

    /// Connection URL. For the memory driver: `memory:` or `file:<path>`
    #[arg(short, long, env = "USERDAO_URL")]
    pub url: Option<String>,

    /// Connection user name
    #[arg(long, env = "USERDAO_USERNAME")]
    pub username: Option<String>,

    /// Connection password
    #[arg(long, env = "USERDAO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// SQL dialect override: sqlite or postgres
    #[arg(long, env = "USERDAO_DIALECT")]
    pub dialect: Option<String>,

    /// Maximum number of pooled connections
    #[arg(long, env = "USERDAO_POOL_SIZE")]
    pub pool_size: Option<u32>,

    /// JSON file whose keys override the backend configuration
    #[arg(long, env = "USERDAO_EXTERNAL_CONFIG")]
    pub external_config: Option<PathBuf>,

    /// Connect to the backend in the background while the console starts
    #[arg(long, env = "USERDAO_PARALLEL_INIT")]
    pub parallel_init: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read commands from standard input, one per line (default)
    Console,
    /// Run a single command and exit
    Run {
        /// Command name, e.g. `getuser`
        name: String,
        /// Command arguments
        args: Vec<String>,
    },
    /// List the available commands
    ListCommands,
}

impl Cli {
    /// Build the backend configuration: the config file if given, else an
    /// ephemeral in-memory directory, with explicit flags layered on top.
    pub async fn backend_config(&self) -> userdao::Result<BackendConfig> {
        let mut config = match &self.config {
            Some(path) => BackendConfig::load(path).await?,
            None => BackendConfig::in_memory(),
        };

        if let Some(driver) = &self.driver {
            config.driver = driver.clone();
        }
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if self.dialect.is_some() {
            config.dialect = self.dialect.clone();
        }
        if self.pool_size.is_some() {
            config.pool_size = self.pool_size;
        }
        if self.external_config.is_some() {
            config.external_config = self.external_config.clone();
        }
        if self.parallel_init {
            config.parallel_init = true;
        }

        Ok(config)
    }
}
