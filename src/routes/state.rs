use std::sync::Arc;

use crate::{
    cache::TtlCache,
    config::Config,
    models::SearchResult,
    services::providers::{GeminiProvider, GenerationProvider, PosterProvider, TmdbProvider},
};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub cache: TtlCache<SearchResult>,
    pub generator: Arc<dyn GenerationProvider>,
    pub posters: Arc<dyn PosterProvider>,
}

impl AppState {
    pub fn new(
        cache: TtlCache<SearchResult>,
        generator: Arc<dyn GenerationProvider>,
        posters: Arc<dyn PosterProvider>,
    ) -> Self {
        Self {
            cache,
            generator,
            posters,
        }
    }

    /// Wires the Gemini and TMDB providers and a system-clock cache from config
    pub fn from_config(config: &Config) -> Self {
        let generator = GeminiProvider::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
        );
        let posters = TmdbProvider::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_base.clone(),
            config.tmdb_language.clone(),
        );

        Self::new(
            TtlCache::new(config.cache_ttl()),
            Arc::new(generator),
            Arc::new(posters),
        )
    }
}
