//! Which posts a viewer may see.
//!
//! The rule lives here once, as data. The in-memory store evaluates it with
//! [`PostVisibility::admits`]; the PostgreSQL repository translates the same
//! value into a query condition.

use chrono::{DateTime, Utc};

use super::Viewer;
use crate::domain::{Category, Id, Post, User};

/// Visibility filter applied to every post read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVisibility {
    /// No filtering. Used when a user lists their own profile.
    Everything,
    /// Publicly visible posts, plus every post written by the given author
    /// (the viewer), whatever its publish state or date.
    PublicOrAuthoredBy(Option<Id>),
}

impl PostVisibility {
    /// Public posts only, whoever is looking. Used by the front page.
    pub const PUBLIC: Self = Self::PublicOrAuthoredBy(None);

    /// The default rule for a viewer.
    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self::PublicOrAuthoredBy(viewer.id())
    }

    /// The rule for a profile listing: the owner sees all of their posts.
    pub fn for_profile(viewer: &Viewer, owner: &User) -> Self {
        if viewer.id() == Some(owner.id) {
            Self::Everything
        } else {
            Self::for_viewer(viewer)
        }
    }

    /// Published, in a published category, and not dated in the future.
    pub fn is_public(post: &Post, category: &Category, now: DateTime<Utc>) -> bool {
        post.is_published && category.is_published && post.pub_date <= now
    }

    pub fn admits(&self, post: &Post, category: &Category, now: DateTime<Utc>) -> bool {
        match self {
            PostVisibility::Everything => true,
            PostVisibility::PublicOrAuthoredBy(author) => {
                *author == Some(post.author_id) || Self::is_public(post, category, now)
            }
        }
    }
}

/// Which listing a page shows. Category and profile scopes are resolved to
/// ids by the caller, after the not-found checks have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    Index,
    Category(Id),
    Profile(Id),
}

impl ListingScope {
    pub fn contains(&self, post: &Post) -> bool {
        match self {
            ListingScope::Index => true,
            ListingScope::Category(id) => post.category_id == *id,
            ListingScope::Profile(id) => post.author_id == *id,
        }
    }
}

/// A complete listing query: scope, visibility and the instant that
/// separates published from scheduled posts.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery {
    pub scope: ListingScope,
    pub visibility: PostVisibility,
    pub now: DateTime<Utc>,
}

impl PostQuery {
    pub fn new(scope: ListingScope, visibility: PostVisibility, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            visibility,
            now,
        }
    }

    pub fn matches(&self, post: &Post, category: &Category) -> bool {
        self.scope.contains(post) && self.visibility.admits(post, category, self.now)
    }
}
