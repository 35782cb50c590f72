//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::{Comment, CommentView};
pub use location::Location;
pub use post::{Post, PostSummary};
pub use user::{User, UserProfile};

/// Primary key type shared by every entity.
///
/// A value of `0` marks an entity that has not been persisted yet.
pub type Id = i64;

/// Sentinel id for entities that have not been stored.
pub const UNSAVED_ID: Id = 0;
