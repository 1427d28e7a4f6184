use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Classification and reading/viewing-order recommendation for one work
///
/// Only `title` and `order` are strictly typed. The remaining fields come from
/// model output as-is: a value of the wrong type degrades to a default instead
/// of failing the whole record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    /// Display name of the work
    pub title: String,
    /// Search term for poster lookup, usually the English title
    #[serde(default, deserialize_with = "lenient_string")]
    pub tmdb_query: Option<String>,
    /// Adaptation lineage, e.g. "책 → 영화"
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag: Option<String>,
    /// Description of the original source
    #[serde(default, deserialize_with = "lenient_string")]
    pub original: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,
    /// Ordered consumption steps
    pub order: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tips: Vec<String>,
}

impl WorkRecord {
    /// Term used for poster lookup: `tmdbQuery` when set, otherwise the title
    pub fn search_term(&self) -> &str {
        self.tmdb_query
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .unwrap_or(&self.title)
    }
}

/// The composite payload served to clients and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub success: bool,
    pub work: WorkRecord,
    pub poster_url: Option<String>,
}

impl SearchResult {
    pub fn new(work: WorkRecord, poster_url: Option<String>) -> Self {
        Self {
            success: true,
            work,
            poster_url,
        }
    }
}

/// Strings pass through, numbers and booleans are rendered, anything else is `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        value @ (Value::Number(_) | Value::Bool(_)) => Some(value.to_string()),
        _ => None,
    })
}

/// An array keeps its string items, a lone string becomes a one-item list
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) => vec![text],
        _ => Vec::new(),
    })
}
