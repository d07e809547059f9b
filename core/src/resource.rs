//! Article and podcast operations, written once over a resource descriptor.
//!
//! # Design
//! Both resources share endpoint shapes and envelope layouts and differ only
//! in path and JSON key. [`Resource`] captures those differences; the generic
//! `create`/`fetch`/`search`/`search_paginated` methods implement the
//! operations, and the named methods (`create_article`, `get_podcast`, ...)
//! pin the type parameter. The trait is sealed: the set of resources is the
//! set the service exposes.
//!
//! `id` and `tag` values are percent-encoded before being placed in the path.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::{decode, Client};
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{
    Article, ArticleResponse, ArticlesResponse, CreateArticleRequest, CreatePodcastRequest,
    PaginatedArticlesResponse, PaginatedPodcastsResponse, Podcast, PodcastResponse,
    PodcastsResponse,
};

/// Recommended page size for paginated searches. The service accepts 1-100.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Article {}
    impl Sealed for super::Podcast {}
}

/// Describes one warehouse collection: where it lives and how its envelopes
/// are shaped.
pub trait Resource: sealed::Sealed + Sized {
    /// Upsert payload.
    type CreateRequest: Serialize;
    /// `{"<name>": {...}}`
    type Single: DeserializeOwned;
    /// `{"<plural>": [...]}`
    type Many: DeserializeOwned;
    /// `{"<plural>": [...], "total", "page", "limit"}`
    type Page: DeserializeOwned;

    const COLLECTION_PATH: &'static str;
    const NAME: &'static str;
    const PLURAL: &'static str;

    fn from_single(envelope: Self::Single) -> Self;
    fn from_many(envelope: Self::Many) -> Vec<Self>;
}

impl Resource for Article {
    type CreateRequest = CreateArticleRequest;
    type Single = ArticleResponse;
    type Many = ArticlesResponse;
    type Page = PaginatedArticlesResponse;

    const COLLECTION_PATH: &'static str = "/api/v1/articles";
    const NAME: &'static str = "article";
    const PLURAL: &'static str = "articles";

    fn from_single(envelope: ArticleResponse) -> Self {
        envelope.article
    }

    fn from_many(envelope: ArticlesResponse) -> Vec<Self> {
        envelope.articles
    }
}

impl Resource for Podcast {
    type CreateRequest = CreatePodcastRequest;
    type Single = PodcastResponse;
    type Many = PodcastsResponse;
    type Page = PaginatedPodcastsResponse;

    const COLLECTION_PATH: &'static str = "/api/v1/podcasts";
    const NAME: &'static str = "podcast";
    const PLURAL: &'static str = "podcasts";

    fn from_single(envelope: PodcastResponse) -> Self {
        envelope.podcast
    }

    fn from_many(envelope: PodcastsResponse) -> Vec<Self> {
        envelope.podcasts
    }
}

fn item_path<R: Resource>(id: &str) -> String {
    format!("{}/{}", R::COLLECTION_PATH, urlencoding::encode(id))
}

fn search_path<R: Resource>(tag: &str) -> String {
    format!("{}/search/{}", R::COLLECTION_PATH, urlencoding::encode(tag))
}

fn paginated_path<R: Resource>(tag: &str, page: u32, limit: u32) -> String {
    format!("{}/paginated?page={page}&limit={limit}", search_path::<R>(tag))
}

impl<T: Transport> Client<T> {
    /// Create or update (keyed by URL) a resource and return the stored copy.
    pub fn create<R: Resource>(&self, request: &R::CreateRequest) -> Result<R, ApiError> {
        self.post(R::COLLECTION_PATH, request)
            .and_then(|body| decode(&body))
            .map(R::from_single)
            .map_err(|e| e.context(format!("error creating {}", R::NAME)))
    }

    /// Fetch a resource by id. A missing id surfaces as `UnexpectedStatus`
    /// with the server's status (normally 404).
    pub fn fetch<R: Resource>(&self, id: &str) -> Result<R, ApiError> {
        self.get(&item_path::<R>(id))
            .and_then(|body| decode(&body))
            .map(R::from_single)
            .map_err(|e| e.context(format!("error retrieving {}", R::NAME)))
    }

    /// All resources carrying `tag`, in the order the server returns them.
    pub fn search<R: Resource>(&self, tag: &str) -> Result<Vec<R>, ApiError> {
        self.get(&search_path::<R>(tag))
            .and_then(|body| decode(&body))
            .map(R::from_many)
            .map_err(|e| e.context(format!("error searching {}", R::PLURAL)))
    }

    /// One page of a tag search. `page` starts at 1; neither argument is
    /// validated here, the server rejects out-of-range values.
    pub fn search_paginated<R: Resource>(
        &self,
        tag: &str,
        page: u32,
        limit: u32,
    ) -> Result<R::Page, ApiError> {
        self.get(&paginated_path::<R>(tag, page, limit))
            .and_then(|body| decode(&body))
            .map_err(|e| e.context(format!("error searching {} with pagination", R::PLURAL)))
    }

    pub fn create_article(&self, request: &CreateArticleRequest) -> Result<Article, ApiError> {
        self.create::<Article>(request)
    }

    pub fn get_article(&self, id: &str) -> Result<Article, ApiError> {
        self.fetch::<Article>(id)
    }

    pub fn search_articles(&self, tag: &str) -> Result<Vec<Article>, ApiError> {
        self.search::<Article>(tag)
    }

    pub fn search_articles_paginated(
        &self,
        tag: &str,
        page: u32,
        limit: u32,
    ) -> Result<PaginatedArticlesResponse, ApiError> {
        self.search_paginated::<Article>(tag, page, limit)
    }

    pub fn create_podcast(&self, request: &CreatePodcastRequest) -> Result<Podcast, ApiError> {
        self.create::<Podcast>(request)
    }

    pub fn get_podcast(&self, id: &str) -> Result<Podcast, ApiError> {
        self.fetch::<Podcast>(id)
    }

    pub fn search_podcasts(&self, tag: &str) -> Result<Vec<Podcast>, ApiError> {
        self.search::<Podcast>(tag)
    }

    pub fn search_podcasts_paginated(
        &self,
        tag: &str,
        page: u32,
        limit: u32,
    ) -> Result<PaginatedPodcastsResponse, ApiError> {
        self.search_paginated::<Podcast>(tag, page, limit)
    }
}
