use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Id, UNSAVED_ID};

/// Comment entity. Comments carry no visibility flag of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub text: String,
    pub post_id: Id,
    pub author_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Id, author_id: Id, text: String) -> Self {
        Self {
            id: UNSAVED_ID,
            text,
            post_id,
            author_id,
            created_at: Utc::now(),
        }
    }
}

/// A comment with its author's username, as rendered under a post.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author_username: String,
}
