use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{MediaType, MetadataService, TmdbError};
use crate::{config::TmdbConfig, users::SearchKind};

/// HTTP client for the TMDB v3 API.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, TmdbError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%path, "tmdb request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            warn!(%path, %status, "tmdb returned error status");
            return Err(TmdbError::Status {
                path: path.to_string(),
                status,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    async fn get_results(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>, TmdbError> {
        let body = self.get_json(path, params).await?;
        extract_results(body, path)
    }
}

/// Pulls the `results` array out of a list response.
fn extract_results(body: Value, path: &str) -> Result<Vec<Value>, TmdbError> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(TmdbError::Malformed(format!("{path}: missing results array"))),
        },
        _ => Err(TmdbError::Malformed(format!("{path}: expected an object"))),
    }
}

#[async_trait]
impl MetadataService for TmdbClient {
    #[instrument(skip(self))]
    async fn search(&self, kind: SearchKind, query: &str) -> Result<Vec<Value>, TmdbError> {
        let path = format!("/search/{}", kind.as_str());
        self.get_results(
            &path,
            &[
                ("query", query),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", "1"),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn trending(&self, media: MediaType) -> Result<Vec<Value>, TmdbError> {
        let path = format!("/trending/{}/day", media.as_str());
        self.get_results(&path, &[("language", "en-US")]).await
    }

    #[instrument(skip(self))]
    async fn details(&self, media: MediaType, id: u64) -> Result<Value, TmdbError> {
        let path = format!("/{}/{}", media.as_str(), id);
        self.get_json(&path, &[("language", "en-US")]).await
    }

    #[instrument(skip(self))]
    async fn similar(&self, media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError> {
        let path = format!("/{}/{}/similar", media.as_str(), id);
        self.get_results(&path, &[("language", "en-US"), ("page", "1")])
            .await
    }

    #[instrument(skip(self))]
    async fn by_category(
        &self,
        media: MediaType,
        category: &str,
    ) -> Result<Vec<Value>, TmdbError> {
        let path = format!("/{}/{}", media.as_str(), category);
        self.get_results(&path, &[("language", "en-US"), ("page", "1")])
            .await
    }

    #[instrument(skip(self))]
    async fn trailers(&self, media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError> {
        let path = format!("/{}/{}/videos", media.as_str(), id);
        self.get_results(&path, &[("language", "en-US")]).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
