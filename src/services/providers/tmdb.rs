//! TMDB poster lookup provider
//!
//! Uses the multi-type search endpoint so books adapted into movies, series or
//! anime all resolve through one call.

use crate::{
    error::{AppError, AppResult},
    models::TmdbSearchResponse,
    services::providers::PosterProvider,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    image_base: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(
        api_key: Option<String>,
        api_url: String,
        image_base: String,
        language: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_base,
            language,
        }
    }

    /// Absolute URL of the first poster in the provider's ranking
    fn poster_url(&self, response: &TmdbSearchResponse) -> Option<String> {
        response
            .first_poster_path()
            .map(|path| format!("{}{}", self.image_base, path))
    }
}

#[async_trait::async_trait]
impl PosterProvider for TmdbProvider {
    async fn find_poster(&self, term: &str) -> AppResult<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Enrichment("TMDB_API_KEY is not set".to_string()))?;

        let url = format!("{}/search/multi", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("query", term),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            // The URL carries the API key
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Enrichment(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let results: TmdbSearchResponse =
            response.json().await.map_err(reqwest::Error::without_url)?;
        let poster_url = self.poster_url(&results);

        tracing::info!(
            term = %term,
            results = results.results.len(),
            found = poster_url.is_some(),
            provider = "tmdb",
            "Poster search completed"
        );

        Ok(poster_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };
    use tokio::net::TcpListener;

    const API_KEY: &str = "tmdb-test-key";
    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    type CapturedParams = Arc<Mutex<Option<HashMap<String, String>>>>;

    /// Serves `app` on an ephemeral local port and returns its base URL
    async fn spawn_upstream(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", address)
    }

    async fn upstream_returning(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route("/search/multi", get(move || async move { (status, body) }));
        spawn_upstream(app).await
    }

    fn provider_at(api_url: String) -> TmdbProvider {
        TmdbProvider {
            http_client: HttpClient::builder().no_proxy().build().unwrap(),
            api_key: Some(API_KEY.to_string()),
            api_url,
            image_base: IMAGE_BASE.to_string(),
            language: "ko-KR".to_string(),
        }
    }

    async fn capture_params(
        State(captured): State<CapturedParams>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        *captured.lock().unwrap() = Some(params);
        Json(json!({ "results": [{ "media_type": "movie", "poster_path": "/abc.jpg" }] }))
    }

    fn create_test_provider(api_key: Option<&str>) -> TmdbProvider {
        TmdbProvider::new(
            api_key.map(str::to_string),
            "http://test.local".to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            "ko-KR".to_string(),
        )
    }

    #[test]
    fn test_poster_url_concatenates_image_base() {
        let provider = create_test_provider(Some("key"));
        let response: TmdbSearchResponse = serde_json::from_str(
            r#"{"results":[{"id":671,"media_type":"movie","title":"Harry Potter","poster_path":"/abc.jpg"}]}"#,
        )
        .unwrap();

        assert_eq!(
            provider.poster_url(&response),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg".to_string())
        );
    }

    #[test]
    fn test_poster_url_none_without_poster_path() {
        let provider = create_test_provider(Some("key"));
        let response: TmdbSearchResponse =
            serde_json::from_str(r#"{"results":[{"id":1,"media_type":"person","name":"Someone"}]}"#)
                .unwrap();

        assert_eq!(provider.poster_url(&response), None);
    }

    #[test]
    fn test_poster_url_none_for_empty_results() {
        let provider = create_test_provider(Some("key"));
        assert_eq!(provider.poster_url(&TmdbSearchResponse::default()), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_enrichment_error() {
        let provider = create_test_provider(None);

        let err = tokio_test::assert_err!(provider.find_poster("Harry Potter").await);
        assert!(matches!(err, AppError::Enrichment(ref msg) if msg.contains("TMDB_API_KEY")));
    }

    #[tokio::test]
    async fn test_find_poster_sends_search_params() {
        let captured = CapturedParams::default();
        let app = Router::new()
            .route("/search/multi", get(capture_params))
            .with_state(captured.clone());
        let base = spawn_upstream(app).await;
        let provider = provider_at(format!("{}/", base));

        let poster = provider.find_poster("Harry Potter").await.unwrap();

        assert_eq!(poster.as_deref(), Some("https://image.tmdb.org/t/p/w500/abc.jpg"));
        let params = captured.lock().unwrap().take().unwrap();
        assert_eq!(params["api_key"], API_KEY);
        assert_eq!(params["query"], "Harry Potter");
        assert_eq!(params["language"], "ko-KR");
    }

    #[tokio::test]
    async fn test_find_poster_error_status_is_enrichment_error() {
        let base = upstream_returning(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;

        let err = tokio_test::assert_err!(provider_at(base).find_poster("Dune").await);
        assert!(matches!(err, AppError::Enrichment(ref msg) if msg.contains("503") && msg.contains("maintenance")));
    }

    #[tokio::test]
    async fn test_find_poster_malformed_body_is_http_error() {
        let base = upstream_returning(StatusCode::OK, "<html>not json</html>").await;

        let err = tokio_test::assert_err!(provider_at(base).find_poster("Dune").await);
        match &err {
            AppError::HttpClient(e) => assert!(e.url().is_none()),
            other => panic!("expected http client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_poster_empty_results() {
        let base = upstream_returning(StatusCode::OK, r#"{"page":1,"results":[]}"#).await;

        assert_eq!(provider_at(base).find_poster("unknownwork").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_poster_results_without_poster_path() {
        let base = upstream_returning(
            StatusCode::OK,
            r#"{"results":[{"media_type":"person","poster_path":null},{"media_type":"movie"}]}"#,
        )
        .await;

        assert_eq!(provider_at(base).find_poster("Dune").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_poster_connection_refused_hides_api_key() {
        let provider = provider_at("http://127.0.0.1:1".to_string());

        let err = tokio_test::assert_err!(provider.find_poster("Dune").await);
        match &err {
            AppError::HttpClient(e) => {
                assert!(e.is_connect());
                assert!(e.url().is_none());
            }
            other => panic!("expected http client error, got {other:?}"),
        }
        assert!(!err.to_string().contains(API_KEY));
    }
}
