//! Google Gemini text generation provider
//!
//! Sends a single-turn `generateContent` request and returns the concatenated
//! text of the first candidate. No retries and no timeout beyond reqwest's
//! defaults: every failure surfaces as an upstream error for the request.

use crate::{
    error::{AppError, AppResult},
    models::{GenerateContentRequest, GenerateContentResponse, GeminiErrorResponse},
    services::providers::GenerationProvider,
};
use reqwest::{Client as HttpClient, StatusCode};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Upstream("GEMINI_API_KEY is not set".to_string()))
    }
}

#[async_trait::async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(describe_error(status, &body)));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = response_text(&body)?;

        tracing::info!(
            model = %self.model,
            chars = text.chars().count(),
            finish_reason = body.finish_reason().unwrap_or("unknown"),
            provider = "gemini",
            "Generation completed"
        );

        Ok(text)
    }
}

fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorResponse>(body) {
        Ok(parsed) => format!("Gemini API returned status {}: {}", status, parsed.error.message),
        Err(_) => format!("Gemini API returned status {}: {}", status, body),
    }
}

fn response_text(response: &GenerateContentResponse) -> AppResult<String> {
    response.text().ok_or_else(|| match response.block_reason() {
        Some(reason) => AppError::Upstream(format!("Gemini blocked the prompt: {}", reason)),
        None => AppError::Upstream("Gemini returned no text".to_string()),
    })
}
