use serde::{Deserialize, Serialize};

/// A persisted text record.
///
/// `id` is `None` until the store assigns one on insert and never changes after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
}

impl TextDocument {
    /// Create an unsaved document with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Body accepted by `POST /save-text` and `PUT /texts/{id}`.
#[derive(Debug, Deserialize)]
pub struct SaveTextRequest {
    pub text: String,
}
