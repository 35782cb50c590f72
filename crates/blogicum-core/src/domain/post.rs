use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Id, Location, UNSAVED_ID, UserProfile};

/// Post entity - a blog entry placed into a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author_id: Id,
    pub category_id: Id,
    pub location_id: Option<Id>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new, not yet persisted post. Posts start out published.
    pub fn new(
        author_id: Id,
        title: String,
        text: String,
        pub_date: DateTime<Utc>,
        category_id: Id,
        location_id: Option<Id>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            title,
            text,
            pub_date,
            is_published: true,
            author_id,
            category_id,
            location_id,
            created_at: Utc::now(),
        }
    }
}

/// A post joined with everything a listing or detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub post: Post,
    pub author: UserProfile,
    pub category: Category,
    pub location: Option<Location>,
    pub comment_count: u64,
}
