//! HTTP backend
//!
//! Talks to a json-server compatible REST API

use async_trait::async_trait;
use reqwest::Response;
use serde_json::Value;
use url::Url;

use crate::ids::Id;

use super::Backend;
use super::Collection;
use super::Error;
use super::Result;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                reason: err.to_string(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A json-server compatible backend
#[derive(Clone, Debug)]
pub struct Http {
    /// Shared connection pool
    client: reqwest::Client,

    /// Base URL, collections are resolved relative to it
    base_url: Url,
}

impl Http {
    /// Create a backend for a base URL, like `http://localhost:3000`
    ///
    /// # Errors
    ///
    /// Will return `Err` when the URL can not have paths (`mailto:` and friends)
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL can not be used as a base: {base_url}");
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, collection: Collection, id: Option<&Id>) -> Url {
        let mut url = self.base_url.clone();

        // checked to be a base URL when created
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(collection.name());

            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }

        url
    }
}

/// Turn non-2xx responses into errors
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}

async fn read_json<T>(response: Response) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    Ok(check_status(response)?.json::<T>().await?)
}

#[async_trait]
impl Backend for Http {
    async fn list(&self, collection: Collection, filter: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.url(collection, None);

        tracing::debug!("GET {url} {filter:?}");

        let response = self.client.get(url).query(filter).send().await?;

        read_json(response).await
    }

    async fn get(&self, collection: Collection, id: &Id) -> Result<Option<Value>> {
        let url = self.url(collection, Some(id));

        tracing::debug!("GET {url}");

        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_json(response).await.map(Some)
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        let url = self.url(collection, None);

        tracing::debug!("POST {url}");

        let response = self.client.post(url).json(&record).send().await?;

        read_json(response).await
    }

    async fn replace(&self, collection: Collection, id: &Id, record: Value) -> Result<Value> {
        let url = self.url(collection, Some(id));

        tracing::debug!("PUT {url}");

        let response = self.client.put(url).json(&record).send().await?;

        read_json(response).await
    }

    async fn patch(&self, collection: Collection, id: &Id, changes: Value) -> Result<Value> {
        let url = self.url(collection, Some(id));

        tracing::debug!("PATCH {url}");

        let response = self.client.patch(url).json(&changes).send().await?;

        read_json(response).await
    }

    async fn delete(&self, collection: Collection, id: &Id) -> Result<()> {
        let url = self.url(collection, Some(id));

        tracing::debug!("DELETE {url}");

        let response = self.client.delete(url).send().await?;

        // json-server answers with an empty object, nothing to read
        check_status(response).map(|_| ())
    }
}
