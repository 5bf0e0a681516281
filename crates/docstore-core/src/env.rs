// Environment detection, connection configuration and logger setup.

use std::env::VarError;
use std::sync::OnceLock;

use crate::error::ConfigError;

/// Connection string variable, read once at startup.
pub const URL_ENV: &str = "MONGODB_URL";

/// Optional database name override.
pub const DATABASE_ENV: &str = "MONGODB_DATABASE";

/// Cached environment mode.
static ENV_MODE: OnceLock<EnvMode> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Production,
    Development,
    Test,
}

/// Detect the current environment mode from `DOCSTORE_ENV`, then `RUST_ENV`.
pub fn detect_env_mode() -> EnvMode {
    *ENV_MODE.get_or_init(|| {
        let env_val = std::env::var("DOCSTORE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default()
            .to_lowercase();

        parse_env_mode(&env_val)
    })
}

fn parse_env_mode(value: &str) -> EnvMode {
    match value {
        "production" | "prod" => EnvMode::Production,
        "test" | "testing" => EnvMode::Test,
        _ => EnvMode::Development,
    }
}

pub fn is_production() -> bool {
    detect_env_mode() == EnvMode::Production
}

pub fn is_test() -> bool {
    detect_env_mode() == EnvMode::Test
}

/// Where to connect.
///
/// `database` overrides the database named in the URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    pub database: Option<String>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        if !(url.starts_with("mongodb://") || url.starts_with("mongodb+srv://")) {
            return Err(ConfigError::InvalidUrl(url));
        }
        Ok(Self {
            url,
            database: None,
        })
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Read `MONGODB_URL` (required) and `MONGODB_DATABASE` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_url_var(std::env::var(URL_ENV))?;
        Ok(match std::env::var(DATABASE_ENV) {
            Ok(name) if !name.is_empty() => {
                tracing::debug!("[Config] database '{}' from {}", name, DATABASE_ENV);
                config.with_database(name)
            }
            _ => config,
        })
    }

    fn from_url_var(value: Result<String, VarError>) -> Result<Self, ConfigError> {
        match value {
            Ok(url) => Self::new(url),
            Err(VarError::NotPresent) => Err(ConfigError::MissingEnv(URL_ENV)),
            Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidUrl(format!(
                "{URL_ENV} is not valid unicode: {}",
                raw.to_string_lossy()
            ))),
        }
    }
}

/// Initialize the `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `docstore=info` in production and
/// `docstore=debug` elsewhere. In test mode events go to the test writer.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production() {
            EnvFilter::new("docstore=info")
        } else {
            EnvFilter::new("docstore=debug")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    // Under test, route output through the harness so it is captured.
    let _ = if is_test() {
        builder.with_test_writer().try_init()
    } else {
        builder.try_init()
    };
}
