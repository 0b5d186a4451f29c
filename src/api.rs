use async_trait::async_trait;
use log::{debug, error};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::models::FishRecord;

pub const DEFAULT_API_URL: &str = "https://halak.onrender.com/api/Halak";

pub const NOT_FOUND_MESSAGE: &str = "A hal nem található";
pub const UNAVAILABLE_MESSAGE: &str = "A hálózat nem elérhető";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not build request url")]
    Url(#[from] url::ParseError),

    #[error("Could not reach api")]
    Transport(#[source] reqwest::Error),

    #[error("Fish not found")]
    NotFound,

    #[error("Api responded with {0}")]
    Status(StatusCode),

    #[error("Could not decode response")]
    Decode(#[source] reqwest::Error),

    #[error("Api rejected update with {status}")]
    Rejected {
        status: StatusCode,
        reason: String,
        body: String,
    },
}

impl Error {
    /// Message shown when fetching a fish failed.
    pub fn message(&self) -> &'static str {
        match self {
            Error::NotFound => NOT_FOUND_MESSAGE,
            _ => UNAVAILABLE_MESSAGE,
        }
    }

    /// Detail shown when an update failed.
    pub fn detail(&self) -> String {
        match self {
            Error::Rejected { body, .. } if !body.is_empty() => body.clone(),
            Error::Rejected { status, reason, .. } => {
                format!("Hiba a feltöltés során: {} {reason}", status.as_u16())
            }
            err => err.to_string(),
        }
    }
}

/// Body of a successful update.
#[derive(Debug, Clone, PartialEq)]
pub enum Updated {
    Json(Value),
    Text(String),
}

#[async_trait]
pub trait FishApi: Send + Sync {
    async fn list(&self) -> Result<Vec<FishRecord>, Error>;

    async fn get(&self, id: i64) -> Result<FishRecord, Error>;

    async fn update(&self, id: i64, record: &FishRecord) -> Result<Updated, Error>;
}

#[derive(Debug, Clone)]
pub struct HttpFishApi {
    client: Client,
    base: Url,
}

impl HttpFishApi {
    pub fn new(client: Client, base: &str) -> Result<Self, Error> {
        // without the trailing slash `join` would replace the last segment
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{base}/"))?
        };

        Ok(Self { client, base })
    }

    fn collection(&self) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
        }
        url
    }

    fn record(&self, id: i64) -> Result<Url, Error> {
        Ok(self.base.join(&id.to_string())?)
    }
}

#[async_trait]
impl FishApi for HttpFishApi {
    async fn list(&self) -> Result<Vec<FishRecord>, Error> {
        let url = self.collection();
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        response.json().await.map_err(Error::Decode)
    }

    async fn get(&self, id: i64) -> Result<FishRecord, Error> {
        let url = self.record(id)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound),
            status if !status.is_success() => Err(Error::Status(status)),
            _ => response.json().await.map_err(Error::Decode),
        }
    }

    async fn update(&self, id: i64, record: &FishRecord) -> Result<Updated, Error> {
        let url = self.record(id)?;
        debug!("PUT {url}");

        let response = self
            .client
            .put(url)
            .json(record)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        debug!("Update of fish {id} answered with {status}");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Api rejected update of fish {id}: {body}");
            return Err(Error::Rejected {
                status,
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        let updated = if is_json {
            Updated::Json(response.json().await.map_err(Error::Decode)?)
        } else {
            Updated::Text(response.text().await.map_err(Error::Decode)?)
        };
        debug!("Updated fish {id}: {updated:?}");

        Ok(updated)
    }
}
