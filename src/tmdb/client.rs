//! TMDB API client
//!
//! Movie search by free-text title, plus raw poster downloads from the TMDB
//! image CDN.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, error};

use crate::core::models::{Movie, SearchResponse};
use crate::errors::BotError;

/// Where movies and their posters come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// First movie matching `query`, or `None` when the search is empty.
    async fn search_movie(&self, query: &str) -> Result<Option<Movie>, BotError>;

    /// Raw bytes of the image at `url`.
    async fn download_poster(&self, url: &str) -> Result<Vec<u8>, BotError>;
}

pub struct TmdbClient {
    http: Client,
    token: String,
    base_url: String,
}

impl TmdbClient {
    #[must_use]
    pub fn new(http: Client, token: String, base_url: &str) -> Self {
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn search_movie(&self, query: &str) -> Result<Option<Movie>, BotError> {
        let url = format!("{}/3/search/movie", self.base_url);
        let resp = self
            .http
            .get(url)
            .query(&[("query", query), ("page", "1")])
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            error!("TMDB search failed: status={} body={}", status, body);
            return Err(BotError::TmdbApi {
                status: status.as_u16(),
                body,
            });
        }

        let data: SearchResponse = resp.json().await?;
        debug!(query, results = data.results.len(), "TMDB search completed");
        Ok(data.results.into_iter().next())
    }

    async fn download_poster(&self, url: &str) -> Result<Vec<u8>, BotError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}
