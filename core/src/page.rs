//! The host page as seen by the façade.
//!
//! A browser host maps these calls onto DOM lookups by element id,
//! `confirm()` and `alert()`. Tests use an in-memory page.

use crate::render::View;

/// Element identifiers the façade reads from and renders into.
pub mod ids {
    pub const API_URL: &str = "apiUrl";
    pub const API_KEY: &str = "apiKey";
    pub const CONNECTION_STATUS: &str = "connectionStatus";

    pub const CREATE_NAME: &str = "createName";
    pub const CREATE_STATUS: &str = "createStatus";
    pub const CREATE_CATEGORY: &str = "createCategory";
    pub const CREATE_PRIORITY: &str = "createPriority";
    pub const CREATE_RESULT: &str = "createResult";

    pub const FILTER_STATUS: &str = "filterStatus";
    pub const LIMIT_DOCS: &str = "limitDocs";
    pub const SKIP_DOCS: &str = "skipDocs";
    pub const DOCUMENTS_CONTAINER: &str = "documentsContainer";

    pub const UPDATE_QUERY: &str = "updateQuery";
    pub const UPDATE_DATA: &str = "updateData";
    pub const UPDATE_RESULT: &str = "updateResult";

    pub const DELETE_QUERY: &str = "deleteQuery";
    pub const DELETE_RESULT: &str = "deleteResult";
}

pub trait Page {
    /// Current value of a form field; missing elements read as empty.
    fn field(&self, id: &str) -> String;

    fn set_field(&mut self, id: &str, value: &str);

    /// Replace the contents of a panel.
    fn render(&mut self, id: &str, view: View);

    /// Blocking yes/no question.
    fn confirm(&mut self, message: &str) -> bool;

    fn alert(&mut self, message: &str);

    /// Switch a field between masked and plain-text input.
    fn toggle_masked(&mut self, id: &str);
}
