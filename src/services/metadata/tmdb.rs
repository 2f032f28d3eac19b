/// TMDB catalog provider (API v3)
///
/// Wraps the four read endpoints the pipeline needs. Per the client contract,
/// any transport error or non-2xx status is logged and collapsed to an empty
/// result; enrichment data is non-critical and availability wins over error
/// signaling here.
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{
        CastEntry, CreditsResponse, DetailsResponse, MediaDetails, MediaType, ProvidersResponse,
        SearchHit, SearchResponse, WatchProvider,
    },
    services::metadata::{MetadataClient, MAX_CAST_ENTRIES},
};

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for {}",
                response.status(),
                path
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MetadataClient for TmdbClient {
    async fn search_multi(&self, term: &str, language: &str) -> Vec<SearchHit> {
        let params = [
            ("query", term),
            ("language", language),
            ("include_adult", "false"),
        ];

        match self.get_json::<SearchResponse>("/search/multi", &params).await {
            Ok(response) => {
                tracing::debug!(
                    term = %term,
                    language = %language,
                    results = response.results.len(),
                    "Multi search completed"
                );
                response.results.into_iter().map(SearchHit::from).collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, term = %term, "Multi search failed, treating as no hits");
                Vec::new()
            }
        }
    }

    async fn watch_providers(
        &self,
        id: u64,
        media_type: MediaType,
        region: &str,
    ) -> Vec<WatchProvider> {
        let path = format!("/{}/{}/watch/providers", media_type.as_str(), id);

        match self.get_json::<ProvidersResponse>(&path, &[]).await {
            Ok(mut response) => response
                .results
                .remove(region)
                .and_then(|r| r.flatrate)
                .unwrap_or_default()
                .into_iter()
                .map(WatchProvider::from)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, id, "Watch provider lookup failed, treating as none");
                Vec::new()
            }
        }
    }

    async fn credits(&self, id: u64, media_type: MediaType, language: &str) -> Vec<CastEntry> {
        let path = format!("/{}/{}/credits", media_type.as_str(), id);
        let params = [("language", language)];

        match self.get_json::<CreditsResponse>(&path, &params).await {
            Ok(response) => response
                .cast
                .into_iter()
                .take(MAX_CAST_ENTRIES)
                .map(CastEntry::from)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, id, "Credits lookup failed, treating as empty cast");
                Vec::new()
            }
        }
    }

    async fn details(&self, id: u64, media_type: MediaType, language: &str) -> MediaDetails {
        let path = format!("/{}/{}", media_type.as_str(), id);
        let params = [("language", language)];

        match self.get_json::<DetailsResponse>(&path, &params).await {
            Ok(response) => response.into(),
            Err(e) => {
                tracing::warn!(error = %e, id, "Details lookup failed, returning empty details");
                MediaDetails::default()
            }
        }
    }
}
