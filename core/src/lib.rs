//! Blocking client for the Data Warehouse microservice.
//!
//! # Overview
//! Wraps the service's JSON-over-HTTP API for articles, podcasts and the
//! health check. Every call is a single synchronous round-trip: build the
//! request, attach `Content-Type` and bearer `Authorization` headers, send
//! it, require status 200, decode the envelope.
//!
//! # Design
//! - `Client` holds only the base URL, the token and a [`Transport`]; it is
//!   immutable after construction.
//! - Article and podcast operations are implemented once over the sealed
//!   [`Resource`] descriptor; the named methods are thin aliases.
//! - There is no retry, caching or batching. Errors carry the operation name
//!   and leave recovery to the caller.
//!
//! ```no_run
//! use warehouse_client::{Client, CreateArticleRequest};
//!
//! # fn main() -> Result<(), warehouse_client::ApiError> {
//! let client = Client::new("http://localhost:8080", "api-key")?;
//! let article = client.create_article(&CreateArticleRequest {
//!     title: "Ownership in practice".to_string(),
//!     url: "https://example.com/ownership".to_string(),
//!     tags: vec!["rust".to_string()],
//!     ..Default::default()
//! })?;
//! let same = client.get_article(&article.id)?;
//! assert_eq!(same.url, article.url);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use resource::{Resource, DEFAULT_PAGE_LIMIT};
pub use transport::UreqTransport;
pub use types::{
    Article, ArticleResponse, ArticlesResponse, CreateArticleRequest, CreatePodcastRequest,
    ErrorDetail, ErrorResponse, HealthResponse, PaginatedArticlesResponse,
    PaginatedPodcastsResponse, Podcast, PodcastResponse, PodcastsResponse,
};
