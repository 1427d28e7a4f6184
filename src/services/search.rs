use crate::{
    cache::TtlCache,
    cached,
    error::AppResult,
    models::{SearchResult, WorkRecord},
    services::{
        extractor::extract_work_record,
        prompt::build_prompt,
        providers::{GenerationProvider, PosterProvider},
    },
};

/// Resolves a free-text query into a classified, poster-decorated result
///
/// Serves from `cache` when an unexpired entry exists for the exact query.
/// Otherwise asks the generation model, extracts the work record, looks up a
/// poster and caches the composite. Generation and extraction failures are
/// returned to the caller and nothing is cached; poster lookup failures only
/// leave `poster_url` empty.
///
/// Concurrent misses for the same query are not coalesced: each one calls the
/// upstream providers and the last insert wins.
pub async fn resolve_work(
    cache: &TtlCache<SearchResult>,
    generator: &dyn GenerationProvider,
    posters: &dyn PosterProvider,
    query: &str,
) -> AppResult<SearchResult> {
    cached!(cache, query.to_string(), async move {
        let raw = generator.generate(&build_prompt(query)).await.map_err(|e| {
            tracing::error!(error = %e, query = %query, "Generation request failed");
            e
        })?;

        let work = extract_work_record(&raw)?;
        let poster_url = lookup_poster(posters, &work).await;

        tracing::info!(
            query = %query,
            title = %work.title,
            has_poster = poster_url.is_some(),
            "Work resolved"
        );

        AppResult::Ok(SearchResult::new(work, poster_url))
    })
}

/// Poster URL for `work`, or `None` on any lookup failure
async fn lookup_poster(posters: &dyn PosterProvider, work: &WorkRecord) -> Option<String> {
    let term = work.search_term();
    match posters.find_poster(term).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, term = %term, "Poster lookup failed, continuing without poster");
            None
        }
    }
}
