use serde::Deserialize;

/// Response from TMDB `GET /search/multi`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

impl TmdbSearchResponse {
    /// Poster path of the highest-ranked result that has one
    pub fn first_poster_path(&self) -> Option<&str> {
        self.results
            .iter()
            .filter_map(|result| result.poster_path.as_deref())
            .find(|path| !path.is_empty())
    }
}

/// One movie, TV or person hit. Only the poster is read.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    #[serde(default)]
    pub poster_path: Option<String>,
}
