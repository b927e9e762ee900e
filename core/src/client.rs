//! Request builder and response parser for the document store API.
//!
//! # Design
//! `DocumentClient` holds a snapshot of the endpoint configuration and no
//! other state. Each operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The façade runs the round-trip in between through its `Transport`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    DeleteResult, DocumentPage, ErrorBody, HealthStatus, InsertResult, ListQuery, NewDocument,
    UpdateRequest, UpdateResult,
};

pub const HEALTH_PATH: &str = "/api/health";
pub const DOCUMENTS_PATH: &str = "/api/documents";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Caller-supplied part of a request. Headers given here override the
/// defaults of the same name.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn method(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Options carrying `payload` serialized as the JSON body.
    pub fn json<T: Serialize>(method: HttpMethod, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            method,
            headers: Vec::new(),
            body: Some(body),
        })
    }
}

/// Stateless client for the document store API.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    base_url: String,
    api_key: String,
}

impl DocumentClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build an authenticated request against `endpoint` (path plus optional
    /// query string). Fails before anything is sent when the URL or key is
    /// empty.
    pub fn build_request(&self, endpoint: &str, options: RequestOptions) -> Result<HttpRequest, ApiError> {
        if self.base_url.is_empty() || self.api_key.is_empty() {
            return Err(ApiError::ConfigRequired);
        }

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            (API_KEY_HEADER.to_string(), self.api_key.clone()),
        ];
        for (name, value) in options.headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
                Some(slot) => *slot = (name, value),
                None => headers.push((name, value)),
            }
        }

        Ok(HttpRequest {
            method: options.method,
            path: format!("{}{endpoint}", self.base_url),
            headers,
            body: options.body,
        })
    }

    /// Decode a JSON body, turning non-2xx statuses into `ApiError::Http`.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// The health check needs only a URL and carries no credentials.
    pub fn build_health_check(&self) -> Result<HttpRequest, ApiError> {
        if self.base_url.is_empty() {
            return Err(ApiError::ConfigRequired);
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{HEALTH_PATH}", self.base_url),
            headers: Vec::new(),
            body: None,
        })
    }

    /// `Ok(true)` only for a 2xx response whose body reports `healthy`.
    /// Unhealthy backends usually answer 503 with a valid body, which yields
    /// `Ok(false)`; an unparseable body is an error.
    pub fn parse_health_check(&self, response: HttpResponse) -> Result<bool, ApiError> {
        let health: HealthStatus =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Ok(response.is_success() && health.is_healthy())
    }

    pub fn build_list_documents(&self, query: &ListQuery) -> Result<HttpRequest, ApiError> {
        let mut params = Vec::new();
        if let Some(status) = &query.status {
            params.push(format!("filter={}", encode_json(&json!({ "status": status }))));
        }
        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }
        if let Some(skip) = query.skip {
            params.push(format!("skip={skip}"));
        }

        let endpoint = if params.is_empty() {
            DOCUMENTS_PATH.to_string()
        } else {
            format!("{DOCUMENTS_PATH}?{}", params.join("&"))
        };
        self.build_request(&endpoint, RequestOptions::default())
    }

    pub fn build_create_document(&self, input: &NewDocument) -> Result<HttpRequest, ApiError> {
        self.build_request(DOCUMENTS_PATH, RequestOptions::json(HttpMethod::Post, input)?)
    }

    pub fn build_update_documents(&self, input: &UpdateRequest) -> Result<HttpRequest, ApiError> {
        self.build_request(DOCUMENTS_PATH, RequestOptions::json(HttpMethod::Put, input)?)
    }

    /// Delete every record matching `filter`. The filter is passed through
    /// as-is.
    pub fn build_delete_documents(&self, filter: &Value) -> Result<HttpRequest, ApiError> {
        let endpoint = format!("{DOCUMENTS_PATH}?filter={}", encode_json(filter));
        self.build_request(&endpoint, RequestOptions::method(HttpMethod::Delete))
    }

    /// Delete the record whose `_id` is `id`.
    pub fn build_delete_document(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.build_delete_documents(&json!({ "_id": { "$oid": id } }))
    }

    pub fn parse_list_documents(&self, response: HttpResponse) -> Result<DocumentPage, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_create_document(&self, response: HttpResponse) -> Result<InsertResult, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_update_documents(&self, response: HttpResponse) -> Result<UpdateResult, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_delete_documents(&self, response: HttpResponse) -> Result<DeleteResult, ApiError> {
        self.parse_response(response)
    }
}

fn encode_json(value: &Value) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

/// Map a non-2xx response to `ApiError::Http`, preferring the server's own
/// `error` message over the bare status.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("HTTP {}", response.status));
    Err(ApiError::Http {
        status: response.status,
        message,
    })
}
