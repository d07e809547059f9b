//! In-memory stand-in for the Data Warehouse service.
//!
//! Serves the same routes and JSON envelopes as the real service so the
//! client can be exercised end to end. Records live in a `Vec` per
//! collection, in insertion order, and are upserted by URL.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Store {
    articles: Vec<Record>,
    podcasts: Vec<Record>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    api_key: Arc<str>,
}

/// One collection of the warehouse: its route prefix and envelope keys.
pub trait Collection: Send + Sync + 'static {
    const PATH: &'static str;
    const ONE: &'static str;
    const MANY: &'static str;

    fn records(store: &Store) -> &Vec<Record>;
    fn records_mut(store: &mut Store) -> &mut Vec<Record>;
}

pub enum Articles {}

impl Collection for Articles {
    const PATH: &'static str = "/api/v1/articles";
    const ONE: &'static str = "article";
    const MANY: &'static str = "articles";

    fn records(store: &Store) -> &Vec<Record> {
        &store.articles
    }

    fn records_mut(store: &mut Store) -> &mut Vec<Record> {
        &mut store.articles
    }
}

pub enum Podcasts {}

impl Collection for Podcasts {
    const PATH: &'static str = "/api/v1/podcasts";
    const ONE: &'static str = "podcast";
    const MANY: &'static str = "podcasts";

    fn records(store: &Store) -> &Vec<Record> {
        &store.podcasts
    }

    fn records_mut(store: &mut Store) -> &mut Vec<Record> {
        &mut store.podcasts
    }
}

/// Error body in the service's `{"error": {"message", "code"}}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "message": self.message, "code": self.code } });
        (self.status, Json(body)).into_response()
    }
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        api_key: Arc::from(api_key),
    };
    let api = collection_routes::<Podcasts>(collection_routes::<Articles>(Router::new()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn collection_routes<K: Collection>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(K::PATH, post(upsert_record::<K>))
        .route(&format!("{}/{{id}}", K::PATH), get(get_record::<K>))
        .route(&format!("{}/search/{{tag}}", K::PATH), get(search_records::<K>))
        .route(
            &format!("{}/search/{{tag}}/paginated", K::PATH),
            get(search_records_paginated::<K>),
        )
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected.as_str()) {
        debug!(uri = %request.uri(), "rejected request without valid bearer token");
        return ApiFailure::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "invalid or missing API key")
            .into_response();
    }
    next.run(request).await
}

fn envelope(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "database": "connected",
        "timestamp": Utc::now(),
    }))
}

async fn upsert_record<K: Collection>(
    State(state): State<AppState>,
    Json(input): Json<CreateRecord>,
) -> Result<Json<Value>, ApiFailure> {
    if input.title.trim().is_empty() {
        return Err(ApiFailure::validation("title is required"));
    }
    if input.url.trim().is_empty() {
        return Err(ApiFailure::validation("url is required"));
    }

    let now = Utc::now();
    let mut store = state.db.write().await;
    let records = K::records_mut(&mut store);
    let record = match records.iter_mut().find(|r| r.url == input.url) {
        Some(existing) => {
            existing.title = input.title;
            existing.description = input.description;
            existing.tags = input.tags;
            existing.updated_at = now;
            info!(collection = K::MANY, id = %existing.id, "updated record");
            existing.clone()
        }
        None => {
            let record = Record {
                id: Uuid::new_v4().to_string(),
                title: input.title,
                description: input.description,
                url: input.url,
                tags: input.tags,
                created_at: now,
                updated_at: now,
            };
            info!(collection = K::MANY, id = %record.id, "created record");
            records.push(record.clone());
            record
        }
    };
    Ok(Json(envelope(K::ONE, json!(record))))
}

async fn get_record<K: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    let store = state.db.read().await;
    let record = K::records(&store).iter().find(|r| r.id == id).cloned();
    record
        .map(|r| Json(envelope(K::ONE, json!(r))))
        .ok_or_else(|| {
            ApiFailure::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", K::ONE))
        })
}

fn tagged<'a>(records: &'a [Record], tag: &'a str) -> impl Iterator<Item = &'a Record> {
    records.iter().filter(move |r| r.tags.iter().any(|t| t == tag))
}

async fn search_records<K: Collection>(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<Value> {
    let store = state.db.read().await;
    let matches: Vec<&Record> = tagged(K::records(&store), &tag).collect();
    Json(envelope(K::MANY, json!(matches)))
}

async fn search_records_paginated<K: Collection>(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiFailure> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if page < 1 {
        return Err(ApiFailure::validation("page must be at least 1"));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiFailure::validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let store = state.db.read().await;
    let total = tagged(K::records(&store), &tag).count();
    let offset = (page - 1).saturating_mul(limit) as usize;
    let items: Vec<&Record> = tagged(K::records(&store), &tag)
        .skip(offset)
        .take(limit as usize)
        .collect();

    let mut body = envelope(K::MANY, json!(items));
    body["total"] = json!(total);
    body["page"] = json!(page);
    body["limit"] = json!(limit);
    Ok(Json(body))
}
