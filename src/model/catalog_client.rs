//! HTTP catalog client
//!
//! Fetches the track catalog from the CMS endpoint. The wire shape is
//! `{ "data": [ {id, name, artist, cover, url}, ... ] }`; anything else is
//! treated as a fetch failure. Parsing is split out of the transport so it
//! can be tested without a server.

use serde::Deserialize;

use super::catalog::{TrackCatalog, TrackRecord};
use super::session::PlayerError;

const DEFAULT_CATALOG_URL: &str = "https://cms.samespace.com/items/songs";

#[derive(Deserialize)]
struct CatalogResponse {
    data: Vec<TrackRecord>,
}

#[derive(Clone)]
pub struct CatalogClient {
    endpoint: String,
    client: reqwest::Client,
}

impl CatalogClient {
    /// Client against the default endpoint, overridable through the
    /// `VPLAYER_CATALOG_URL` environment variable.
    pub fn new() -> Self {
        let endpoint = std::env::var("VPLAYER_CATALOG_URL")
            .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
        Self::with_endpoint(endpoint)
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch and parse the catalog. On any failure the caller keeps its
    /// current catalog; there is no retry here.
    pub async fn fetch(&self) -> Result<TrackCatalog, PlayerError> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching track catalog");

        let body = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| PlayerError::CatalogFetch(e.to_string()))?
            .text()
            .await
            .map_err(|e| PlayerError::CatalogFetch(e.to_string()))?;

        let catalog = parse_catalog(&body)?;
        tracing::info!(tracks = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_catalog(body: &str) -> Result<TrackCatalog, PlayerError> {
    let response: CatalogResponse = serde_json::from_str(body)
        .map_err(|e| PlayerError::CatalogFetch(format!("unexpected payload: {e}")))?;
    Ok(TrackCatalog::new(response.data))
}
