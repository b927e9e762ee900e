//! End-to-end façade run against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every façade
//! operation through an in-memory page and a ureq-backed transport. ureq is
//! blocking, so each request runs on tokio's blocking pool.

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use docstore_core::{
    ids, ApiError, Facade, FileStore, HttpMethod, HttpRequest, HttpResponse, MemoryStore,
    NoticeKind, Page, Transport, View,
};

const API_KEY: &str = "it-key";

struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Status codes are returned as data so the client can interpret them.
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait(?Send)]
impl Transport for UreqTransport {
    async fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, String> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || send(&agent, request))
            .await
            .map_err(|e| e.to_string())?
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, String> {
    let result = match (req.method, req.body) {
        (HttpMethod::Get, _) => with_headers(agent.get(&req.path), &req.headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&req.path), &req.headers).call(),
        (HttpMethod::Post, Some(body)) => {
            with_headers(agent.post(&req.path), &req.headers).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => with_headers(agent.post(&req.path), &req.headers).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            with_headers(agent.put(&req.path), &req.headers).send(body.as_bytes())
        }
        (HttpMethod::Put, None) => with_headers(agent.put(&req.path), &req.headers).send_empty(),
    };
    let mut response = result.map_err(|e| e.to_string())?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

#[derive(Default)]
struct FormPage {
    fields: HashMap<String, String>,
    views: HashMap<String, View>,
    confirm_answer: bool,
    alerts: Vec<String>,
}

impl FormPage {
    fn configured(addr: SocketAddr) -> Self {
        let mut page = Self {
            confirm_answer: true,
            ..Self::default()
        };
        page.set_field(ids::API_URL, &format!("http://{addr}"));
        page.set_field(ids::API_KEY, API_KEY);
        page.set_field(ids::CREATE_PRIORITY, "1");
        page
    }

    fn message(&self, id: &str) -> (NoticeKind, String) {
        let notice = self
            .views
            .get(id)
            .and_then(View::notice)
            .unwrap_or_else(|| panic!("no notice in {id}"));
        (notice.kind, notice.message.clone())
    }

    fn listing(&self) -> &View {
        self.views.get(ids::DOCUMENTS_CONTAINER).expect("documents panel not rendered")
    }

    fn fill_create(&mut self, name: &str, status: &str, priority: &str) {
        self.set_field(ids::CREATE_NAME, name);
        self.set_field(ids::CREATE_STATUS, status);
        self.set_field(ids::CREATE_CATEGORY, "integration");
        self.set_field(ids::CREATE_PRIORITY, priority);
    }
}

impl Page for FormPage {
    fn field(&self, id: &str) -> String {
        self.fields.get(id).cloned().unwrap_or_default()
    }

    fn set_field(&mut self, id: &str, value: &str) {
        self.fields.insert(id.to_string(), value.to_string());
    }

    fn render(&mut self, id: &str, view: View) {
        self.views.insert(id.to_string(), view);
    }

    fn confirm(&mut self, _message: &str) -> bool {
        self.confirm_answer
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn toggle_masked(&mut self, _id: &str) {}
}

/// Start the mock server on a random port and return its address.
fn start_server(state: mock_server::AppState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    addr
}

#[tokio::test]
async fn crud_lifecycle() {
    let state = mock_server::AppState::new(Some(API_KEY.to_string()));
    let addr = start_server(state.clone());
    let mut facade = Facade::new(UreqTransport::new(), MemoryStore::default());
    let mut page = FormPage::configured(addr);

    // Step 1: connection test.
    facade.test_connection(&mut page).await;
    assert_eq!(page.message(ids::CONNECTION_STATUS).0, NoticeKind::Success);

    // Step 2: empty store.
    facade.list_documents(&mut page, false).await;
    assert_eq!(page.listing(), &View::NoDocuments);

    // Step 3: create three records through the form.
    for (name, status) in [("Alpha", "pending"), ("Beta", "pending"), ("Gamma", "completed")] {
        page.fill_create(name, status, "2");
        facade.create_document(&mut page).await;
        let (kind, message) = page.message(ids::CREATE_RESULT);
        assert_eq!(kind, NoticeKind::Success, "{message}");
        assert!(message.starts_with("Document created with ID: "));
        assert_eq!(page.field(ids::CREATE_NAME), "");
    }
    match page.listing() {
        View::Documents { shown, total, .. } => assert_eq!((*shown, *total), (3, 3)),
        other => panic!("unexpected listing: {other:?}"),
    }

    // Step 4: filtered and limited listing.
    page.set_field(ids::FILTER_STATUS, "pending");
    page.set_field(ids::LIMIT_DOCS, "1");
    facade.list_documents(&mut page, true).await;
    let html = page.listing().to_html();
    assert!(html.contains("Documents (1 of 2 total)"), "{html}");
    assert_eq!(html.matches(r#"<div class="document">"#).count(), 1);
    page.set_field(ids::FILTER_STATUS, "");
    page.set_field(ids::LIMIT_DOCS, "");

    // Step 5: bulk update.
    page.set_field(ids::UPDATE_QUERY, r#"{"status":"pending"}"#);
    page.set_field(ids::UPDATE_DATA, r#"{"$set":{"status":"completed"}}"#);
    facade.update_documents(&mut page).await;
    assert_eq!(
        page.message(ids::UPDATE_RESULT),
        (NoticeKind::Success, "Updated 2 documents (2 matched)".to_string())
    );

    // Step 6: delete one record by the id its block is bound to.
    let first_id = match page.listing() {
        View::Documents { blocks, .. } => blocks[0].id.clone(),
        other => panic!("unexpected listing: {other:?}"),
    };
    facade.delete_one_document(&mut page, &first_id).await;
    assert_eq!(
        page.alerts.last().map(String::as_str),
        Some("✅ Document deleted successfully. Deleted count: 1")
    );
    assert_eq!(state.documents().await.len(), 2);

    // Step 7: declined bulk delete leaves the store untouched.
    page.set_field(ids::DELETE_QUERY, r#"{"status":"completed"}"#);
    page.confirm_answer = false;
    facade.delete_many_documents(&mut page).await;
    assert_eq!(state.documents().await.len(), 2);

    // Step 8: accepted bulk delete.
    page.confirm_answer = true;
    facade.delete_many_documents(&mut page).await;
    assert_eq!(
        page.message(ids::DELETE_RESULT),
        (NoticeKind::Success, "Deleted 2 documents".to_string())
    );
    assert_eq!(page.listing(), &View::NoDocuments);
}

#[tokio::test]
async fn server_errors_render_in_place() {
    let state = mock_server::AppState::new(Some(API_KEY.to_string()));
    let addr = start_server(state.clone());
    let mut facade = Facade::new(UreqTransport::new(), MemoryStore::default());

    // wrong key
    let mut page = FormPage::configured(addr);
    page.set_field(ids::API_KEY, "wrong");
    facade.list_documents(&mut page, false).await;
    assert_eq!(
        page.message(ids::DOCUMENTS_CONTAINER),
        (NoticeKind::Error, "Forbidden".to_string())
    );

    // backend-side validation of an unsupported update operator
    let mut page = FormPage::configured(addr);
    page.set_field(ids::UPDATE_QUERY, "{}");
    page.set_field(ids::UPDATE_DATA, r#"{"$inc":{"priority":1}}"#);
    facade.update_documents(&mut page).await;
    let (kind, message) = page.message(ids::UPDATE_RESULT);
    assert_eq!(kind, NoticeKind::Error);
    assert!(message.starts_with("Update error:"), "{message}");

    // unhealthy store
    state.set_healthy(false);
    facade.test_connection(&mut page).await;
    let (kind, message) = page.message(ids::CONNECTION_STATUS);
    assert_eq!(kind, NoticeKind::Error);
    assert!(message.starts_with("API responded"), "{message}");
}

#[tokio::test]
async fn unreachable_server_reports_connection_failure() {
    // bind then drop to get a port nobody listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let mut facade = Facade::new(UreqTransport::new(), MemoryStore::default());
    let mut page = FormPage::configured(addr);

    facade.test_connection(&mut page).await;
    let (kind, message) = page.message(ids::CONNECTION_STATUS);
    assert_eq!(kind, NoticeKind::Error);
    assert!(message.starts_with("Connection failed: "), "{message}");

    let request = facade
        .request::<serde_json::Value>(&page, "/api/documents", Default::default())
        .await;
    assert!(matches!(request, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn configuration_survives_a_reload() {
    let addr = start_server(mock_server::AppState::new(Some(API_KEY.to_string())));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.json");

    let mut facade = Facade::new(UreqTransport::new(), FileStore::open(&path));
    let mut page = FormPage::configured(addr);
    facade.list_documents(&mut page, false).await;
    drop(facade);

    // new session, blank form
    let mut facade = Facade::new(UreqTransport::new(), FileStore::open(&path));
    let mut fresh = FormPage::default();
    facade.startup(&mut fresh).await;

    assert_eq!(fresh.field(ids::API_URL), format!("http://{addr}"));
    assert_eq!(fresh.field(ids::API_KEY), API_KEY);
    assert_eq!(fresh.listing(), &View::NoDocuments);
}
