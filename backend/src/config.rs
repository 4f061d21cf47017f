//! Process configuration from command-line flags and environment variables.

use std::net::{IpAddr, SocketAddr};

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::db::{PostgresConfig, RepositoryType};

pub const DEFAULT_POSTGRES_DSN: &str =
    "host=localhost user=postgres password=password sslmode=disable";

const FALLBACK_HOSTNAME: &str = "localhost";

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen host '{0}'")]
    InvalidHost(String),
}

/// Command-line arguments of `meta-server`.
#[derive(Parser, Debug, Clone)]
#[command(name = "meta-server")]
#[command(version, about = "Read-only metadata gateway", long_about = None)]
pub struct Args {
    /// The port to open the rest service on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Postgres DSN for the metadata store
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_POSTGRES_DSN)]
    pub postgres: String,

    /// Maximum number of open store connections
    #[arg(long, env = "PG_POOL_MAX", default_value_t = 4)]
    pub pool_max: u32,

    /// Store backend: postgres or local
    #[arg(long, env = "REPOSITORY_TYPE")]
    pub repository: Option<RepositoryType>,

    /// Datadog api key for reporting
    #[arg(long, env = "DATADOG_API_KEY")]
    pub datadog: Option<String>,

    /// Host name attached to reported metrics [default: this machine's name]
    #[arg(long, env = "HOSTNAME")]
    pub hostname: Option<String>,

    /// Display verbose output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn repository_type(&self) -> RepositoryType {
        self.repository.unwrap_or_default()
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig::with_url(self.postgres.clone()).with_max_pool_size(self.pool_max)
    }

    /// Log level implied by the `-v` count.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Host tag of reported metrics: `--hostname`, else the system host name.
    pub fn report_host(&self) -> String {
        match self.hostname.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => system_hostname(),
        }
    }

    /// Datadog key, ignoring an empty value.
    pub fn datadog_key(&self) -> Option<&str> {
        self.datadog.as_deref().filter(|key| !key.is_empty())
    }
}

/// Name of this machine, `localhost` if the system does not report one.
pub fn system_hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        FALLBACK_HOSTNAME.to_string()
    } else {
        name
    }
}
