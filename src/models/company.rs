use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a company record the search subsystem consumes.
///
/// Company profiles live with an external CRUD service; search only needs
/// a display name to denormalize into job documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier
    pub id: Uuid,

    /// Display name
    pub name: String,
}

impl Company {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
