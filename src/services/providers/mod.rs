//! Upstream providers used by the search pipeline
//!
//! Text generation and poster lookup sit behind traits so the pipeline can be
//! exercised with mocks and the concrete APIs swapped without touching it.

use crate::error::AppResult;

pub mod gemini;
pub mod tmdb;

pub use gemini::GeminiProvider;
pub use tmdb::TmdbProvider;

/// Text generation model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Sends `prompt` to the model and returns its raw text answer
    ///
    /// Any failure (missing credential, network error, provider error) is an
    /// [`AppError::Upstream`](crate::error::AppError::Upstream) or
    /// [`AppError::HttpClient`](crate::error::AppError::HttpClient).
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Media database used to decorate results with a poster image
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Absolute poster URL for the best match of `term`, if any
    async fn find_poster(&self, term: &str) -> AppResult<Option<String>>;
}
