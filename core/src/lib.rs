//! Client façade for a document store exposed through a REST API.
//!
//! # Overview
//! A page session owns one `Facade`. UI events call its operations (create,
//! list, bulk update, single and bulk delete, connection test); each one
//! reads the form through `Page`, performs a single request through the
//! host's `Transport`, and renders a `View` back into the page.
//!
//! # Design
//! - `DocumentClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`.
//! - The host supplies network access (`Transport`), persistence
//!   (`ConfigStore`) and the page (`Page`), so the same core runs in a
//!   browser shell, a native shell, or a test.
//! - Filter and update expressions are opaque JSON; the backend interprets
//!   them.

pub mod client;
pub mod config;
pub mod error;
pub mod facade;
pub mod http;
pub mod page;
pub mod render;
pub mod types;

pub use client::{DocumentClient, RequestOptions};
pub use config::{Config, ConfigStore, FileStore, MemoryStore};
pub use error::ApiError;
pub use facade::Facade;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use page::{ids, Page};
pub use render::{DocumentBlock, Notice, NoticeKind, View};
pub use types::{
    DeleteResult, DocumentPage, DocumentRecord, HealthStatus, InsertResult, ListQuery, NewDocument,
    UpdateRequest, UpdateResult,
};
