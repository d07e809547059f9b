//! Wire DTOs for the Data Warehouse API.
//!
//! # Design
//! These types mirror the service's JSON shapes exactly, envelopes included.
//! They are defined independently from the mock-server crate; the
//! integration tests catch schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Lists may arrive as `null` from the service; read those as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An article stored in the warehouse. `url` is the upsert key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A podcast stored in the warehouse. `url` is the upsert key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or updating an article. Re-submitting an existing
/// URL updates that article instead of creating a new one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Payload for creating or updating a podcast, keyed by URL like articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePodcastRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleResponse {
    pub article: Article,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodcastResponse {
    pub podcast: Podcast,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticlesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodcastsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub podcasts: Vec<Podcast>,
}

/// One page of a tag search over articles. `total` counts every match, not
/// just the ones on this page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginatedArticlesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub articles: Vec<Article>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// One page of a tag search over podcasts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginatedPodcastsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub podcasts: Vec<Podcast>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub timestamp: DateTime<Utc>,
}

/// Error body returned by the service on non-200 responses.
///
/// The client never decodes this itself; `ApiError::UnexpectedStatus` keeps
/// the raw text, which callers may feed to `serde_json` for this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}
