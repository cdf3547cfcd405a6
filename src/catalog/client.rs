//! HTTP client for the external music catalog API.

use super::models::{AccessToken, SearchResponse, TokenResponse, Track};
use crate::config::CatalogSettings;
use crate::server::metrics;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// The catalog operations the pipeline depends on. Implemented by
/// [`CatalogClient`]; tests substitute their own.
#[async_trait]
pub trait CatalogSearcher: Send + Sync {
    async fn get_access_token(&self) -> Result<AccessToken, CatalogError>;

    async fn search_tracks(
        &self,
        keywords: &[String],
        token: &AccessToken,
    ) -> Result<Vec<Track>, CatalogError>;
}

/// Errors from the catalog layer. Auth failures are kept distinct from
/// transport failures so the presentation layer can message them differently.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Token exchange was rejected (bad credentials, revoked app).
    #[error("Catalog token exchange failed with status {status}")]
    Auth { status: u16 },

    /// Could not reach the catalog provider at all.
    #[error("Failed to reach catalog API: {0}")]
    Connection(String),

    /// The provider answered with something we could not parse.
    #[error("Invalid response from catalog API: {0}")]
    InvalidResponse(String),
}

/// Client for the catalog provider's token and search endpoints.
pub struct CatalogClient {
    client: reqwest::Client,
    token_url: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    per_keyword_limit: u32,
}

impl CatalogClient {
    pub fn new(settings: &CatalogSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token_url: settings.token_url.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            per_keyword_limit: settings.per_keyword_limit,
        }
    }
}

#[async_trait]
impl CatalogSearcher for CatalogClient {
    /// Exchange the configured client id/secret for a bearer token via the
    /// client-credentials grant. Fetched fresh per submission, no caching.
    async fn get_access_token(&self) -> Result<AccessToken, CatalogError> {
        let params = [("grant_type", "client_credentials")];

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Auth {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        Ok(AccessToken(body.access_token))
    }

    /// Search the catalog once per keyword and collect the results,
    /// deduplicated by track id in first-seen order.
    ///
    /// A keyword whose search returns a non-success status is skipped, never
    /// surfaced; a partial result is treated as success. An empty keyword
    /// list returns an empty result without any network call.
    async fn search_tracks(
        &self,
        keywords: &[String],
        token: &AccessToken,
    ) -> Result<Vec<Track>, CatalogError> {
        let mut tracks = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for keyword in keywords {
            let url = format!(
                "{}/search?q={}&type=track&limit={}",
                self.api_base,
                urlencoding::encode(keyword),
                self.per_keyword_limit,
            );

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token.0))
                .send()
                .await
                .map_err(|e| CatalogError::Connection(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(keyword = %keyword, status = %status, "Catalog search failed, skipping keyword");
                metrics::record_search_skip(status.as_u16());
                continue;
            }

            let body: SearchResponse = response.json().await.map_err(|e| {
                CatalogError::InvalidResponse(format!("Failed to parse search response: {}", e))
            })?;

            let items = body.tracks.unwrap_or_default().items;
            debug!(keyword = %keyword, count = items.len(), "Catalog search results");

            for item in items {
                if seen.contains(&item.id) {
                    continue;
                }
                if let Some(track) = item.into_track() {
                    seen.insert(track.id.clone());
                    tracks.push(track);
                }
            }
        }

        Ok(tracks)
    }
}
