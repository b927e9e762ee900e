//! The client façade: one instance per page session.
//!
//! Every public operation is one linear cycle: refresh the configuration from
//! the form, read the operation's fields, build a request, await the
//! transport, render the outcome. Errors stop at this layer and end up in a
//! result panel or an alert; nothing is returned to the event handler.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{DocumentClient, RequestOptions};
use crate::config::{Config, ConfigStore};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::page::{ids, Page};
use crate::render::{Notice, View};
use crate::types::{
    DeleteResult, DocumentPage, InsertResult, ListQuery, NewDocument, UpdateRequest, UpdateResult,
};

const DEFAULT_PRIORITY: &str = "1";

pub struct Facade<T, S> {
    transport: T,
    store: S,
    config: Config,
}

impl<T: Transport, S: ConfigStore> Facade<T, S> {
    pub fn new(transport: T, store: S) -> Self {
        let config = Config::load(&store);
        Self {
            transport,
            store,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Page-load hook: restore the saved configuration into the form and, if
    /// it is complete, show the current documents. A stored URL wins over the
    /// URL the page ships pre-filled.
    pub async fn startup(&mut self, page: &mut impl Page) {
        let stored = self.load_config();
        let api_url = if stored.api_url.is_empty() {
            page.field(ids::API_URL).trim().to_string()
        } else {
            stored.api_url
        };
        self.config = Config {
            api_url,
            api_key: stored.api_key,
        };
        page.set_field(ids::API_URL, &self.config.api_url);
        page.set_field(ids::API_KEY, &self.config.api_key);

        if self.config.is_complete() {
            self.list_documents(page, false).await;
        }
    }

    pub fn load_config(&self) -> Config {
        Config::load(&self.store)
    }

    /// Take URL and key from the form, persist them, and return a client
    /// bound to them.
    pub fn save_config(&mut self, page: &impl Page) -> DocumentClient {
        self.config = Config::new(&page.field(ids::API_URL), &page.field(ids::API_KEY));
        self.config.save(&mut self.store);
        DocumentClient::new(&self.config)
    }

    pub fn toggle_api_key(&self, page: &mut impl Page) {
        page.toggle_masked(ids::API_KEY);
    }

    pub async fn test_connection(&mut self, page: &mut impl Page) {
        let client = self.save_config(&*page);
        let outcome = match client.build_health_check() {
            Ok(request) => match self.exchange(request).await {
                Ok(response) => client.parse_health_check(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let notice = match outcome {
            Ok(true) => Notice::success("Connection successful! Document store is connected."),
            Ok(false) => Notice::error("API responded but the document store may be disconnected."),
            Err(e) => {
                warn!(error = %e, "health check failed");
                Notice::error(format!("Connection failed: {e}"))
            }
        };
        page.render(ids::CONNECTION_STATUS, View::Notice(notice));
    }

    /// Authenticated request against an arbitrary endpoint of the configured
    /// API, decoded as `R`.
    pub async fn request<R: DeserializeOwned>(
        &mut self,
        page: &impl Page,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let client = self.save_config(page);
        let request = client.build_request(endpoint, options)?;
        let response = self.exchange(request).await?;
        client.parse_response(response)
    }

    pub async fn create_document(&mut self, page: &mut impl Page) {
        match self.try_create(&*page).await {
            Ok(result) => {
                info!(id = %result.inserted_id, "document created");
                page.render(
                    ids::CREATE_RESULT,
                    View::Notice(Notice::success(format!(
                        "Document created with ID: {}",
                        result.inserted_id
                    ))),
                );
                page.set_field(ids::CREATE_NAME, "");
                page.set_field(ids::CREATE_CATEGORY, "");
                page.set_field(ids::CREATE_PRIORITY, DEFAULT_PRIORITY);
                self.list_documents(page, false).await;
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                page.render(ids::CREATE_RESULT, View::Notice(Notice::error(e.to_string())));
            }
        }
    }

    async fn try_create(&mut self, page: &impl Page) -> Result<InsertResult, ApiError> {
        let client = self.configured_client(page)?;
        let input = read_new_document(page)?;
        let request = client.build_create_document(&input)?;
        let response = self.exchange(request).await?;
        client.parse_create_document(response)
    }

    /// Refresh the documents panel. `force` skips the loading placeholder so
    /// the previous listing stays visible until the new one arrives.
    pub async fn list_documents(&mut self, page: &mut impl Page, force: bool) {
        if !force {
            page.render(
                ids::DOCUMENTS_CONTAINER,
                View::Loading("Loading documents...".to_string()),
            );
        }

        match self.try_list(&*page).await {
            Ok(result) => {
                debug!(shown = result.documents.len(), total = result.total, "documents listed");
                page.render(ids::DOCUMENTS_CONTAINER, View::documents(&result));
            }
            Err(e) => {
                warn!(error = %e, "listing failed");
                page.render(ids::DOCUMENTS_CONTAINER, View::Notice(Notice::error(e.to_string())));
            }
        }
    }

    async fn try_list(&mut self, page: &impl Page) -> Result<DocumentPage, ApiError> {
        let client = self.configured_client(page)?;
        let query = read_list_query(page)?;
        let request = client.build_list_documents(&query)?;
        let response = self.exchange(request).await?;
        client.parse_list_documents(response)
    }

    pub async fn update_documents(&mut self, page: &mut impl Page) {
        match self.try_update(&*page).await {
            Ok(result) => {
                info!(matched = result.matched_count, modified = result.modified_count, "documents updated");
                page.render(
                    ids::UPDATE_RESULT,
                    View::Notice(Notice::success(format!(
                        "Updated {} documents ({} matched)",
                        result.modified_count, result.matched_count
                    ))),
                );
                self.list_documents(page, false).await;
            }
            Err(e) => {
                warn!(error = %e, "update failed");
                page.render(ids::UPDATE_RESULT, View::Notice(Notice::error(e.to_string())));
            }
        }
    }

    async fn try_update(&mut self, page: &impl Page) -> Result<UpdateResult, ApiError> {
        let client = self.configured_client(page)?;
        let query_text = page.field(ids::UPDATE_QUERY).trim().to_string();
        let update_text = page.field(ids::UPDATE_DATA).trim().to_string();
        if query_text.is_empty() || update_text.is_empty() {
            return Err(ApiError::Validation(
                "Both query and update data are required".to_string(),
            ));
        }
        let input = UpdateRequest {
            query: parse_json_field("query", &query_text)?,
            update: parse_json_field("update", &update_text)?,
        };
        let request = client.build_update_documents(&input)?;
        let response = self.exchange(request).await?;
        client.parse_update_documents(response)
    }

    /// Delete a single record after the user confirms. The outcome is
    /// reported through an alert since the record's block is about to
    /// disappear.
    pub async fn delete_one_document(&mut self, page: &mut impl Page, id: &str) {
        if !page.confirm("Are you sure you want to delete this document?") {
            return;
        }

        match self.try_delete_one(&*page, id).await {
            Ok(result) => {
                info!(id, deleted = result.deleted_count, "document deleted");
                page.alert(&format!(
                    "✅ Document deleted successfully. Deleted count: {}",
                    result.deleted_count
                ));
                self.list_documents(page, false).await;
            }
            Err(e) => {
                warn!(id, error = %e, "delete failed");
                page.alert(&format!("❌ Error deleting document: {e}"));
            }
        }
    }

    async fn try_delete_one(&mut self, page: &impl Page, id: &str) -> Result<DeleteResult, ApiError> {
        let client = self.configured_client(page)?;
        let request = client.build_delete_document(id)?;
        let response = self.exchange(request).await?;
        client.parse_delete_documents(response)
    }

    pub async fn delete_many_documents(&mut self, page: &mut impl Page) {
        if !page.confirm("Are you sure you want to delete documents matching this query?") {
            return;
        }

        match self.try_delete_many(&*page).await {
            Ok(result) => {
                info!(deleted = result.deleted_count, "documents deleted");
                page.render(
                    ids::DELETE_RESULT,
                    View::Notice(Notice::success(format!("Deleted {} documents", result.deleted_count))),
                );
                self.list_documents(page, false).await;
            }
            Err(e) => {
                warn!(error = %e, "bulk delete failed");
                page.render(ids::DELETE_RESULT, View::Notice(Notice::error(e.to_string())));
            }
        }
    }

    async fn try_delete_many(&mut self, page: &impl Page) -> Result<DeleteResult, ApiError> {
        let client = self.configured_client(page)?;
        let query_text = page.field(ids::DELETE_QUERY).trim().to_string();
        if query_text.is_empty() {
            return Err(ApiError::Validation(
                "Query is required for delete operation".to_string(),
            ));
        }
        let filter = parse_json_field("query", &query_text)?;
        let request = client.build_delete_documents(&filter)?;
        let response = self.exchange(request).await?;
        client.parse_delete_documents(response)
    }

    /// Persist the form's config; fails unless both values are set. Runs
    /// before any form field is validated.
    fn configured_client(&mut self, page: &impl Page) -> Result<DocumentClient, ApiError> {
        let client = self.save_config(page);
        if !self.config.is_complete() {
            return Err(ApiError::ConfigRequired);
        }
        Ok(client)
    }

    async fn exchange(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        let response = self.transport.execute(request).await.map_err(ApiError::Transport)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

fn read_new_document(page: &impl Page) -> Result<NewDocument, ApiError> {
    let name = page.field(ids::CREATE_NAME).trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    let priority = page
        .field(ids::CREATE_PRIORITY)
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::Validation("Priority must be an integer".to_string()))?;
    Ok(NewDocument {
        name,
        status: page.field(ids::CREATE_STATUS),
        category: page.field(ids::CREATE_CATEGORY).trim().to_string(),
        priority,
    })
}

fn read_list_query(page: &impl Page) -> Result<ListQuery, ApiError> {
    Ok(ListQuery {
        status: non_empty(page.field(ids::FILTER_STATUS)),
        limit: parse_count(page, ids::LIMIT_DOCS, "Limit")?,
        skip: parse_count(page, ids::SKIP_DOCS, "Skip")?,
    })
}

fn parse_count(page: &impl Page, id: &str, label: &str) -> Result<Option<u32>, ApiError> {
    non_empty(page.field(id))
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| ApiError::Validation(format!("{label} must be a non-negative integer")))
        })
        .transpose()
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_json_field(field: &str, text: &str) -> Result<Value, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::InvalidJson {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
