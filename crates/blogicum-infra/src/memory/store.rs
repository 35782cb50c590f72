//! A single in-memory store implementing every repository port.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use blogicum_core::domain::{
    Category, Comment, CommentView, Id, Location, Post, PostSummary, UNSAVED_ID, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::policy::PostQuery;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};

/// Rows that carry a numeric primary key.
trait Row: Clone {
    fn id(&self) -> Id;
    fn set_id(&mut self, id: Id);
}

macro_rules! impl_row {
    ($($ty:ty),*) => {
        $(impl Row for $ty {
            fn id(&self) -> Id {
                self.id
            }

            fn set_id(&mut self, id: Id) {
                self.id = id;
            }
        })*
    };
}

impl_row!(User, Category, Location, Post, Comment);

#[derive(Default)]
struct Tables {
    last_id: Id,
    users: BTreeMap<Id, User>,
    categories: BTreeMap<Id, Category>,
    locations: BTreeMap<Id, Location>,
    posts: BTreeMap<Id, Post>,
    comments: BTreeMap<Id, Comment>,
}

impl Tables {
    fn summarize(&self, post: &Post) -> Result<PostSummary, RepoError> {
        let author = self
            .users
            .get(&post.author_id)
            .ok_or_else(|| RepoError::Constraint(format!("post {} has no author", post.id)))?;
        let category = self.categories.get(&post.category_id).ok_or_else(|| {
            RepoError::Constraint(format!("post {} has no category", post.id))
        })?;
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as u64;

        Ok(PostSummary {
            post: post.clone(),
            author: author.profile(),
            category: category.clone(),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id))
                .cloned(),
            comment_count,
        })
    }
}

/// Insert-or-update into one table, assigning ids to unsaved rows.
fn upsert<T: Row>(last_id: &mut Id, table: &mut BTreeMap<Id, T>, mut row: T) -> Result<T, RepoError> {
    if row.id() == UNSAVED_ID {
        *last_id += 1;
        row.set_id(*last_id);
    } else if !table.contains_key(&row.id()) {
        return Err(RepoError::NotFound);
    }
    table.insert(row.id(), row.clone());
    Ok(row)
}

fn remove<T>(table: &mut BTreeMap<Id, T>, id: Id) -> Result<T, RepoError> {
    table.remove(&id).ok_or(RepoError::NotFound)
}

/// In-memory store using ordered maps behind an async RwLock.
///
/// Cloning is cheap and every clone sees the same data.
/// Note: Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A published starter category and location, so that a fresh
    /// database-less instance can accept posts.
    pub async fn seed_defaults(&self) -> Result<(), RepoError> {
        if self.find_by_slug("general").await?.is_some() {
            return Ok(());
        }
        BaseRepository::<Category, Id>::save(
            self,
            Category::new(
                "General".to_string(),
                "Everything that fits nowhere else.".to_string(),
                "general".to_string(),
            ),
        )
        .await?;
        BaseRepository::<Location, Id>::save(self, Location::new("Planet Earth".to_string())).await?;
        tracing::info!("Seeded in-memory store with default category and location");
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<User, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                user.username
            )));
        }
        upsert(&mut tables.last_id, &mut tables.users, user)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        remove(&mut tables.users, id)?;
        tables.posts.retain(|_, p| p.author_id != id);
        let posts = &tables.posts;
        tables
            .comments
            .retain(|_, c| c.author_id != id && posts.contains_key(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        if tables
            .categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is taken",
                category.slug
            )));
        }
        upsert(&mut tables.last_id, &mut tables.categories, category)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        remove(&mut tables.categories, id)?;
        tables.posts.retain(|_, p| p.category_id != id);
        let posts = &tables.posts;
        tables.comments.retain(|_, c| posts.contains_key(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories: Vec<Category> =
            self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Location, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        upsert(&mut tables.last_id, &mut tables.locations, location)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        remove(&mut tables.locations, id)?;
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let mut locations: Vec<Location> = self
            .tables
            .read()
            .await
            .locations
            .values()
            .filter(|l| l.is_published)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let mut locations: Vec<Location> =
            self.tables.read().await.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl BaseRepository<Post, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("unknown author".to_string()));
        }
        if !tables.categories.contains_key(&post.category_id) {
            return Err(RepoError::Constraint("unknown category".to_string()));
        }
        if let Some(location_id) = post.location_id {
            if !tables.locations.contains_key(&location_id) {
                return Err(RepoError::Constraint("unknown location".to_string()));
            }
        }
        upsert(&mut tables.last_id, &mut tables.posts, post)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        remove(&mut tables.posts, id)?;
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError> {
        let tables = self.tables.read().await;
        tables.posts.get(&id).map(|p| tables.summarize(p)).transpose()
    }

    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| {
                tables
                    .categories
                    .get(&post.category_id)
                    .is_some_and(|category| query.matches(post, category))
            })
            .collect();
        matching.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let Some(offset) = page.offset_within(total) else {
            return Ok(Page::new(Vec::new(), page, total));
        };
        let items = matching
            .into_iter()
            .skip(offset as usize)
            .take(page.per_page as usize)
            .map(|post| tables.summarize(post))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl BaseRepository<Comment, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("unknown post".to_string()));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint("unknown author".to_string()));
        }
        upsert(&mut tables.last_id, &mut tables.comments, comment)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.comments, id).map(|_| ())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Id) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.tables.read().await;
        let usernames: HashMap<Id, &str> = tables
            .users
            .values()
            .map(|u| (u.id, u.username.as_str()))
            .collect();

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                comment: comment.clone(),
                author_username: usernames
                    .get(&comment.author_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::policy::{ListingScope, PostVisibility, Viewer};
    use chrono::{Duration, Utc};

    async fn user(store: &InMemoryStore, name: &str) -> User {
        BaseRepository::<User, Id>::save(store, User::new(name.into(), String::new(), "hash".into()))
            .await
            .unwrap()
    }

    async fn category(store: &InMemoryStore, slug: &str, published: bool) -> Category {
        let mut category = Category::new(slug.into(), String::new(), slug.into());
        category.is_published = published;
        BaseRepository::<Category, Id>::save(store, category).await.unwrap()
    }

    async fn post(store: &InMemoryStore, author: &User, category: &Category, title: &str) -> Post {
        let post = Post::new(
            author.id,
            title.into(),
            "body".into(),
            Utc::now() - Duration::hours(1),
            category.id,
            None,
        );
        BaseRepository::<Post, Id>::save(store, post).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_ids_and_updates() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        assert_ne!(alice.id, UNSAVED_ID);

        let mut renamed = alice.clone();
        renamed.username = "alicia".into();
        BaseRepository::<User, Id>::save(&store, renamed).await.unwrap();
        assert!(store.find_by_username("alicia").await.unwrap().is_some());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = InMemoryStore::new();
        user(&store, "alice").await;
        let result =
            BaseRepository::<User, Id>::save(&store, User::new("alice".into(), String::new(), "h".into())).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_listing_applies_visibility_and_order() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let news = category(&store, "news", true).await;
        let older = post(&store, &alice, &news, "older").await;
        let mut hidden = post(&store, &alice, &news, "hidden").await;
        hidden.is_published = false;
        BaseRepository::<Post, Id>::save(&store, hidden).await.unwrap();
        let mut newer = Post::new(alice.id, "newer".into(), "b".into(), Utc::now(), news.id, None);
        newer.pub_date = older.pub_date + Duration::minutes(30);
        BaseRepository::<Post, Id>::save(&store, newer).await.unwrap();

        let now = Utc::now();
        let anonymous = PostQuery::new(
            ListingScope::Index,
            PostVisibility::for_viewer(&Viewer::Anonymous),
            now,
        );
        let page = store.list(&anonymous, PageRequest::new(1, 10)).await.unwrap();
        let titles: Vec<&str> = page.items.iter().map(|s| s.post.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);

        let as_author = PostQuery::new(
            ListingScope::Profile(alice.id),
            PostVisibility::for_viewer(&Viewer::user(alice.id, "alice")),
            now,
        );
        let page = store.list(&as_author, PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total_items, 3);
    }

    #[tokio::test]
    async fn test_listing_paginates() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let news = category(&store, "news", true).await;
        for i in 0..5 {
            post(&store, &alice, &news, &format!("p{i}")).await;
        }
        let query = PostQuery::new(ListingScope::Index, PostVisibility::Everything, Utc::now());
        let page = store.list(&query, PageRequest::new(3, 2)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.num_pages, 3);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_huge_page_number_is_an_empty_page() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let news = category(&store, "news", true).await;
        post(&store, &alice, &news, "only").await;

        let query = PostQuery::new(ListingScope::Index, PostVisibility::Everything, Utc::now());
        let page = store.list(&query, PageRequest::new(u64::MAX, 10)).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_out_of_range());
    }

    #[tokio::test]
    async fn test_summary_counts_comments_and_delete_cascades() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let news = category(&store, "news", true).await;
        let p = post(&store, &alice, &news, "hello").await;
        BaseRepository::<Comment, Id>::save(&store, Comment::new(p.id, bob.id, "first".into()))
            .await
            .unwrap();
        BaseRepository::<Comment, Id>::save(&store, Comment::new(p.id, alice.id, "second".into()))
            .await
            .unwrap();

        let summary = store.find_summary(p.id).await.unwrap().unwrap();
        assert_eq!(summary.comment_count, 2);
        assert_eq!(summary.author.username, "alice");

        let comments = store.list_for_post(p.id).await.unwrap();
        assert_eq!(comments[0].author_username, "bob");
        assert_eq!(comments[1].comment.text, "second");

        BaseRepository::<Post, Id>::delete(&store, p.id).await.unwrap();
        assert!(store.list_for_post(p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_row_is_not_found() {
        let store = InMemoryStore::new();
        let mut ghost = User::new("ghost".into(), String::new(), "h".into());
        ghost.id = 42;
        assert!(matches!(
            BaseRepository::<User, Id>::save(&store, ghost).await,
            Err(RepoError::NotFound)
        ));
    }
}
