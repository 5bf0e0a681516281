// Connection lifecycle — open a client from configuration, hand out the
// database, shut the client down.

use mongodb::options::ClientOptions;
use mongodb::Client;

use docstore_core::error::ConfigError;
use docstore_core::ConnectionConfig;

use crate::adapter::{map_error, MongoDatabase};

/// A live client plus the database handles link against.
///
/// There is no global connection: build one, pass `database()` to
/// `Handle::link`, and call `disconnect` when done.
#[derive(Debug, Clone)]
pub struct MongoConnection {
    client: Client,
    database: MongoDatabase,
}

impl MongoConnection {
    /// Connect using `config`.
    ///
    /// The database comes from `config.database`, else from the URL path.
    /// Server selection is lazy, so an unreachable server surfaces on the
    /// first operation rather than here.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        let options = ClientOptions::parse(config.url.as_str())
            .await
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", config.url)))?;

        let name = config
            .database
            .clone()
            .or_else(|| options.default_database.clone())
            .ok_or_else(|| ConfigError::MissingDatabase(config.url.clone()))?;

        let client = Client::with_options(options).map_err(map_error)?;
        tracing::info!("[MongoDB] connected, database '{}'", name);
        Ok(Self {
            database: MongoDatabase::new(client.database(&name)),
            client,
        })
    }

    /// Connect using `MONGODB_URL` and the optional `MONGODB_DATABASE`.
    pub async fn connect_from_env() -> Result<Self, ConfigError> {
        let config = ConnectionConfig::from_env()?;
        Self::connect(&config).await
    }

    pub fn database(&self) -> &MongoDatabase {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Close every pooled connection and end the client's background tasks.
    pub async fn disconnect(self) {
        let name = self.database.inner().name().to_string();
        self.client.shutdown().await;
        tracing::info!("[MongoDB] disconnected from '{}'", name);
    }
}
