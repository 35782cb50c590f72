//! Who may edit or delete a resource.

use super::Viewer;
use crate::domain::{Comment, Id, Post, User};

/// The resource a mutation is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum MutationTarget<'a> {
    Post(&'a Post),
    Comment(&'a Comment),
    Profile(&'a User),
}

impl MutationTarget<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            MutationTarget::Post(_) => "post",
            MutationTarget::Comment(_) => "comment",
            MutationTarget::Profile(_) => "profile",
        }
    }

    /// Read-only page the viewer lands on when the mutation is refused.
    pub fn fallback(&self) -> Fallback {
        match self {
            MutationTarget::Post(post) => Fallback::PostDetail(post.id),
            MutationTarget::Comment(comment) => Fallback::PostDetail(comment.post_id),
            MutationTarget::Profile(user) => Fallback::Profile(user.username.clone()),
        }
    }
}

/// Where a refused mutation sends the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    PostDetail(Id),
    Profile(String),
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// The viewer must authenticate first.
    Login,
    Denied(Fallback),
}

/// Decide whether `viewer` may mutate `target`.
///
/// Posts and comments are owned by their author; a post's author has no
/// say over other people's comments. A profile is owned by the account with
/// the same id; usernames can change hands after a rename.
pub fn authorize(viewer: &Viewer, target: MutationTarget<'_>) -> Access {
    let Viewer::User { id, .. } = viewer else {
        return Access::Login;
    };

    let owns = match target {
        MutationTarget::Post(post) => post.author_id == *id,
        MutationTarget::Comment(comment) => comment.author_id == *id,
        MutationTarget::Profile(user) => user.id == *id,
    };

    if owns {
        Access::Granted
    } else {
        Access::Denied(target.fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author_id: Id) -> Post {
        let mut post = Post::new(author_id, "t".into(), "x".into(), Utc::now(), 1, None);
        post.id = 5;
        post
    }

    fn comment_by(author_id: Id) -> Comment {
        let mut comment = Comment::new(5, author_id, "hi".into());
        comment.id = 11;
        comment
    }

    #[test]
    fn test_anonymous_must_login_first() {
        assert_eq!(
            authorize(&Viewer::Anonymous, MutationTarget::Post(&post_by(1))),
            Access::Login
        );
        assert_eq!(
            authorize(&Viewer::Anonymous, MutationTarget::Comment(&comment_by(1))),
            Access::Login
        );
    }

    #[test]
    fn test_post_author_granted() {
        let viewer = Viewer::user(1, "alice");
        assert_eq!(authorize(&viewer, MutationTarget::Post(&post_by(1))), Access::Granted);
    }

    #[test]
    fn test_non_author_redirected_to_post_detail() {
        let viewer = Viewer::user(2, "bob");
        assert_eq!(
            authorize(&viewer, MutationTarget::Post(&post_by(1))),
            Access::Denied(Fallback::PostDetail(5))
        );
    }

    #[test]
    fn test_post_author_cannot_touch_foreign_comment() {
        // alice wrote post 5, bob commented on it
        let alice = Viewer::user(1, "alice");
        let bob = Viewer::user(2, "bob");
        let comment = comment_by(2);
        assert_eq!(
            authorize(&alice, MutationTarget::Comment(&comment)),
            Access::Denied(Fallback::PostDetail(5))
        );
        assert_eq!(authorize(&bob, MutationTarget::Comment(&comment)), Access::Granted);
    }

    #[test]
    fn test_profile_checked_by_account_id() {
        let mut target = User::new("alice".into(), String::new(), String::new());
        target.id = 1;
        assert_eq!(
            authorize(&Viewer::user(1, "alice"), MutationTarget::Profile(&target)),
            Access::Granted
        );
        assert_eq!(
            authorize(&Viewer::user(2, "bob"), MutationTarget::Profile(&target)),
            Access::Denied(Fallback::Profile("alice".into()))
        );
        // A viewer now carrying the name under another id is not the owner.
        assert_eq!(
            authorize(&Viewer::user(3, "alice"), MutationTarget::Profile(&target)),
            Access::Denied(Fallback::Profile("alice".into()))
        );
    }
}
