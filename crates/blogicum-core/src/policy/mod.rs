//! Access rules: who may see a post and who may change a resource.

mod ownership;
mod visibility;

pub use ownership::{Access, Fallback, MutationTarget, authorize};
pub use visibility::{ListingScope, PostQuery, PostVisibility};

use crate::domain::Id;

/// The identity a request is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User { id: Id, username: String },
}

impl Viewer {
    pub fn user(id: Id, username: impl Into<String>) -> Self {
        Self::User {
            id,
            username: username.into(),
        }
    }

    pub fn id(&self) -> Option<Id> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User { id, .. } => Some(*id),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User { username, .. } => Some(username),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User { .. })
    }
}
