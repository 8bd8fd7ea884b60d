//! Remote data client
//!
//! Every app keeps its data in a JSON-collection REST backend (json-server or anything that
//! speaks the same dialect). The [`Backend`] trait covers the raw collection operations, the
//! [`Client`] offers one typed function per entity operation on top of it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::ids::Id;
use crate::utils::first_env_var;

pub use http::Http;
pub use memory::Memory;

mod events;
mod http;
mod memory;
mod notes;
mod subscriptions;
mod users;

/// Backend errors
#[derive(Debug, Error)]
pub enum Error {
    /// The backend answered with a non-2xx status
    #[error("{status} {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Reason phrase or response text
        reason: String,
    },

    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Transport(String),

    /// The backend sent something that is not the expected JSON
    #[error("Invalid data: {0}")]
    Decode(String),
}

impl Error {
    pub fn not_found() -> Self {
        Self::Status {
            status: 404,
            reason: String::from("Not Found"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status: 404, .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for all backend interactions
pub type Result<T> = core::result::Result<T, Error>;

/// The collections the apps use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Notes,
    Events,
    Subscriptions,
}

impl Collection {
    /// Path segment of the collection
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Notes => "notes",
            Collection::Events => "events",
            Collection::Subscriptions => "subscriptions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw collection operations of a JSON-collection backend
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// List a collection, optionally filtered by exact field values
    async fn list(&self, collection: Collection, filter: &[(&str, &str)]) -> Result<Vec<Value>>;

    /// Get a single record, `None` when the backend does not know the ID
    async fn get(&self, collection: Collection, id: &Id) -> Result<Option<Value>>;

    /// Create a record, the backend assigns the ID
    async fn create(&self, collection: Collection, record: Value) -> Result<Value>;

    /// Replace a record (PUT)
    async fn replace(&self, collection: Collection, id: &Id, record: Value) -> Result<Value>;

    /// Merge top-level fields into a record (PATCH)
    async fn patch(&self, collection: Collection, id: &Id, changes: Value) -> Result<Value>;

    /// Delete a record
    async fn delete(&self, collection: Collection, id: &Id) -> Result<()>;
}

/// Backend configuration
pub enum Config {
    /// Detect the backend URL from the first set environment variable, falls back to an
    /// in-memory backend
    DetectConfig(&'static [&'static str]),

    /// Use an existing client
    ExistingClient(Client),
}

/// Typed access to the backend of a single app
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    pub fn new<B: Backend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Client for an in-memory backend
    pub fn memory() -> Self {
        Self::new(Memory::new())
    }

    /// Create a client from its configuration
    ///
    /// # Errors
    ///
    /// Will return `Err` when the configured URL is not a valid backend URL
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        match config {
            Config::DetectConfig(env_vars) => {
                if let Some(base_url) = first_env_var(env_vars) {
                    let base_url = Url::parse(&base_url)?;

                    tracing::info!("Using backend at {base_url}");

                    Ok(Self::new(Http::new(base_url)?))
                } else {
                    tracing::info!(
                        "None of {} set, using an in-memory backend",
                        env_vars.join(", ")
                    );

                    Ok(Self::memory())
                }
            }
            Config::ExistingClient(client) => Ok(client),
        }
    }

    async fn fetch_all<T>(&self, collection: Collection, filter: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.backend
            .list(collection, filter)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(Error::from))
            .collect()
    }

    async fn fetch_one<T>(&self, collection: Collection, id: &Id) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.backend
            .get(collection, id)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::from)
    }

    async fn insert<V, T>(&self, collection: Collection, values: &V) -> Result<T>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let record = serde_json::to_value(values)?;
        let created = self.backend.create(collection, record).await?;

        Ok(serde_json::from_value(created)?)
    }

    async fn put<T>(&self, collection: Collection, id: &Id, record: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let record = serde_json::to_value(record)?;
        let replaced = self.backend.replace(collection, id, record).await?;

        Ok(serde_json::from_value(replaced)?)
    }

    async fn remove(&self, collection: Collection, id: &Id) -> Result<()> {
        self.backend.delete(collection, id).await
    }
}
