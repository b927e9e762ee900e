//! In-memory stand-in for the document store REST API.
//!
//! Serves `/api/health` and `/api/documents` with the same request and
//! response shapes as the real backend. Filters support top-level equality,
//! `{"_id": {"$oid": ..}}`, and the `$eq`/`$ne`/`$in` operators; updates
//! support `$set` and `$unset`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub type Document = Map<String, Value>;
pub type Db = Arc<RwLock<Vec<Document>>>;

const DEFAULT_LIMIT: usize = 100;

/// Shared server state. Cloning shares the same store.
#[derive(Clone, Default)]
pub struct AppState {
    db: Db,
    api_key: Option<String>,
    unhealthy: Arc<AtomicBool>,
}

impl AppState {
    /// `api_key: None` disables the `X-API-Key` check.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// Make `/api/health` report a disconnected store.
    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.db.read().await.clone()
    }
}

/// Non-2xx reply in the backend's `{"error": ...}` envelope.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    filter: Option<String>,
    limit: Option<String>,
    skip: Option<String>,
}

pub fn app() -> Router {
    router(AppState::default())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/documents",
            get(list_documents)
                .post(create_document)
                .put(update_documents)
                .delete(delete_documents),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let Some(expected) = &state.api_key else {
        return Ok(());
    };
    let given = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if given == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("rejected request with missing or wrong API key");
        Err(ApiFailure {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden".to_string(),
        })
    }
}

fn parse_body(body: &Bytes) -> Result<Option<Value>, ApiFailure> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|_| ApiFailure::bad_request("Invalid JSON in request body"))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.unhealthy.load(Ordering::SeqCst) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "timestamp": timestamp(),
                "mongodb": "disconnected",
                "error": "store unavailable",
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": timestamp(),
                "mongodb": "connected",
                "version": "1.0.0",
            })),
        )
    }
}

async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let filter = match params.filter.as_deref() {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| ApiFailure::bad_request(format!("Query error: {e}")))?,
        None => json!({}),
    };
    let limit = parse_count(params.limit.as_deref(), DEFAULT_LIMIT)?;
    let skip = parse_count(params.skip.as_deref(), 0)?;

    let docs = state.db.read().await;
    let mut matched = Vec::new();
    for doc in docs.iter() {
        if matches(doc, &filter).map_err(|e| ApiFailure::bad_request(format!("Query error: {e}")))? {
            matched.push(doc.clone());
        }
    }
    let total = matched.len();
    // A limit of 0 means no limit, as in Mongo.
    let take = if limit == 0 { usize::MAX } else { limit };
    let page: Vec<Document> = matched.into_iter().skip(skip).take(take).collect();
    info!(total, returned = page.len(), "listed documents");

    Ok(Json(json!({
        "documents": page,
        "total": total,
        "limit": limit,
        "skip": skip,
        "count": page.len(),
    })))
}

fn parse_count(raw: Option<&str>, default: usize) -> Result<usize, ApiFailure> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiFailure::bad_request(format!("Query error: invalid count {raw:?}"))),
        None => Ok(default),
    }
}

async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiFailure> {
    authorize(&state, &headers)?;

    let mut doc = match parse_body(&body)? {
        Some(Value::Object(doc)) if !doc.is_empty() => doc,
        _ => return Err(ApiFailure::bad_request("Request body is required")),
    };
    let id = Uuid::new_v4().simple().to_string();
    doc.insert("created_at".to_string(), Value::String(timestamp()));
    doc.insert("_id".to_string(), Value::String(id.clone()));
    state.db.write().await.push(doc.clone());
    info!(id = %id, "created document");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document created successfully",
            "inserted_id": id,
            "document": doc,
        })),
    ))
}

async fn update_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let body = parse_body(&body)?.unwrap_or(Value::Null);
    let (Some(query), Some(Value::Object(update))) = (body.get("query"), body.get("update")) else {
        return Err(ApiFailure::bad_request(
            r#"Request body must contain "query" and "update" fields"#,
        ));
    };

    if let Some(op) = update.keys().find(|k| !matches!(k.as_str(), "$set" | "$unset")) {
        return Err(ApiFailure::bad_request(format!("Update error: unsupported operator {op}")));
    }

    let mut update = update.clone();
    let set = update
        .entry("$set")
        .or_insert_with(|| Value::Object(Map::new()));
    match set {
        Value::Object(set) => {
            set.insert("updated_at".to_string(), Value::String(timestamp()));
        }
        _ => return Err(ApiFailure::bad_request("Update error: $set must be an object")),
    }

    let mut docs = state.db.write().await;
    let (mut matched_count, mut modified_count) = (0u64, 0u64);
    for doc in docs.iter_mut() {
        if !matches(doc, query).map_err(|e| ApiFailure::bad_request(format!("Update error: {e}")))? {
            continue;
        }
        matched_count += 1;
        if apply_update(doc, &update).map_err(|e| ApiFailure::bad_request(format!("Update error: {e}")))? {
            modified_count += 1;
        }
    }
    info!(matched_count, modified_count, "updated documents");

    Ok(Json(json!({
        "message": "Documents updated successfully",
        "matched_count": matched_count,
        "modified_count": modified_count,
    })))
}

async fn delete_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let from_body = parse_body(&body)?.and_then(|b| b.get("query").cloned());
    let query = match (from_body, params.filter.as_deref()) {
        (Some(query), _) => query,
        (None, Some(raw)) => serde_json::from_str(raw)
            .map_err(|e| ApiFailure::bad_request(format!("Delete error: {e}")))?,
        (None, None) => Value::Null,
    };
    if query.as_object().map_or(true, Map::is_empty) {
        return Err(ApiFailure::bad_request("Query is required for delete operation"));
    }

    let mut docs = state.db.write().await;
    let before = docs.len();
    let mut failure = None;
    docs.retain(|doc| match matches(doc, &query) {
        Ok(hit) => !hit,
        Err(e) => {
            failure.get_or_insert(e);
            true
        }
    });
    if let Some(e) = failure {
        return Err(ApiFailure::bad_request(format!("Delete error: {e}")));
    }
    let deleted_count = before - docs.len();
    info!(deleted_count, "deleted documents");

    Ok(Json(json!({
        "message": "Documents deleted successfully",
        "deleted_count": deleted_count,
    })))
}

/// Evaluate a filter document against one record.
pub fn matches(doc: &Document, filter: &Value) -> Result<bool, String> {
    let Value::Object(filter) = filter else {
        return Err("filter must be a JSON object".to_string());
    };
    for (field, condition) in filter {
        if !field_matches(doc.get(field), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn field_matches(actual: Option<&Value>, condition: &Value) -> Result<bool, String> {
    let Value::Object(ops) = condition else {
        return Ok(actual == Some(condition));
    };
    if !ops.keys().any(|k| k.starts_with('$')) {
        return Ok(actual == Some(condition));
    }
    for (op, operand) in ops {
        let hit = match op.as_str() {
            "$oid" | "$eq" => actual == Some(operand),
            "$ne" => actual != Some(operand),
            "$in" => match operand {
                Value::Array(options) => actual.is_some_and(|a| options.contains(a)),
                _ => return Err("$in needs an array".to_string()),
            },
            other => return Err(format!("unsupported operator {other}")),
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Apply `$set`/`$unset`; returns whether anything changed.
fn apply_update(doc: &mut Document, update: &Document) -> Result<bool, String> {
    let mut changed = false;
    for (op, fields) in update {
        let Value::Object(fields) = fields else {
            return Err(format!("{op} must be an object"));
        };
        match op.as_str() {
            "$set" => {
                for (k, v) in fields {
                    if doc.get(k) != Some(v) {
                        doc.insert(k.clone(), v.clone());
                        changed = true;
                    }
                }
            }
            "$unset" => {
                for k in fields.keys() {
                    changed |= doc.remove(k).is_some();
                }
            }
            other => return Err(format!("unsupported operator {other}")),
        }
    }
    Ok(changed)
}
