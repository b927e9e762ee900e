//! Structured views handed to the host page.
//!
//! # Design
//! Operations never build markup inline. They produce a `View`; the host
//! either binds it to its own components or injects `View::to_html()`, which
//! escapes every value that came from the store.

use serde_json::Value;

use crate::types::{DocumentPage, DocumentRecord};

const MISSING: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-line outcome shown in a result panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Display form of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlock {
    /// Identifier the delete control is bound to.
    pub id: String,
    /// Label/value pairs in display order.
    pub fields: Vec<(&'static str, String)>,
}

impl DocumentBlock {
    pub fn from_record(record: &DocumentRecord) -> Self {
        let id = record.id_text().unwrap_or_default();
        let mut fields = vec![
            ("ID", id.clone()),
            ("Name", display(record.name.as_ref())),
            ("Status", display(record.status.as_ref())),
            ("Category", display(record.category.as_ref())),
            ("Priority", display(record.priority.as_ref())),
            ("Created", display(record.created_at.as_ref())),
        ];
        if record.updated_at.as_ref().is_some_and(is_present) {
            fields.push(("Updated", display(record.updated_at.as_ref())));
        }
        Self { id, fields }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Loading(String),
    Notice(Notice),
    Documents {
        shown: usize,
        total: u64,
        blocks: Vec<DocumentBlock>,
    },
    NoDocuments,
}

impl View {
    pub fn documents(page: &DocumentPage) -> Self {
        if page.documents.is_empty() {
            return View::NoDocuments;
        }
        View::Documents {
            shown: page.documents.len(),
            total: page.total,
            blocks: page.documents.iter().map(DocumentBlock::from_record).collect(),
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            View::Notice(n) => Some(n),
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            View::Loading(text) => format!("<p>{}</p>", escape_html(text)),
            View::Notice(notice) => render_notice(notice),
            View::NoDocuments => "<p>No documents found.</p>".to_string(),
            View::Documents { shown, total, blocks } => {
                let mut html = format!("<h3>Documents ({shown} of {total} total)</h3>");
                for block in blocks {
                    html.push_str(&render_block(block));
                }
                html
            }
        }
    }
}

fn render_notice(notice: &Notice) -> String {
    let (class, icon) = match notice.kind {
        NoticeKind::Success => ("success", "✅"),
        NoticeKind::Error => ("error", "❌"),
    };
    format!(
        r#"<span class="{class}">{icon} {}</span>"#,
        escape_html(&notice.message)
    )
}

fn render_block(block: &DocumentBlock) -> String {
    let mut html = String::from(r#"<div class="document">"#);
    for (label, value) in &block.fields {
        html.push_str(&format!("<strong>{label}:</strong> {}<br>", escape_html(value)));
    }
    html.push_str(&format!(
        r#"<button class="delete-btn" data-action="delete-document" data-id="{}">Delete This Document</button>"#,
        escape_html(&block.id)
    ));
    html.push_str("</div>");
    html
}

/// Falsy values (null, empty string, zero, false) show as `N/A`.
fn display(value: Option<&Value>) -> String {
    match value {
        Some(v) if is_present(v) => match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        _ => MISSING.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
