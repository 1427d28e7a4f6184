pub mod gemini;
pub mod tmdb;
pub mod work;

pub use gemini::{GenerateContentRequest, GenerateContentResponse, GeminiErrorResponse};
pub use tmdb::{TmdbSearchResponse, TmdbSearchResult};
pub use work::{SearchResult, WorkRecord};
