//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use blogicum_core::domain::{
    Category, Comment, CommentView, Id, Location, Post, PostSummary, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::policy::{ListingScope, PostQuery, PostVisibility};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .filter(location::Column::IsPublished.eq(true))
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Row shape of the per-post comment count query.
#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: i64,
    count: i64,
}

/// SQL form of [`PostVisibility`]. Expects `categories` to be joined.
pub(crate) fn visibility_condition(visibility: PostVisibility, now: DateTime<Utc>) -> Condition {
    match visibility {
        PostVisibility::Everything => Condition::all(),
        PostVisibility::PublicOrAuthoredBy(author) => {
            let public = Condition::all()
                .add(post::Column::IsPublished.eq(true))
                .add(category::Column::IsPublished.eq(true))
                .add(post::Column::PubDate.lte(now));

            match author {
                Some(author_id) => Condition::any()
                    .add(post::Column::AuthorId.eq(author_id))
                    .add(public),
                None => public,
            }
        }
    }
}

/// Full WHERE clause of a listing: scope plus visibility.
pub(crate) fn listing_condition(query: &PostQuery) -> Condition {
    let scope = match query.scope {
        ListingScope::Index => Condition::all(),
        ListingScope::Category(id) => Condition::all().add(post::Column::CategoryId.eq(id)),
        ListingScope::Profile(id) => Condition::all().add(post::Column::AuthorId.eq(id)),
    };

    Condition::all()
        .add(scope)
        .add(visibility_condition(query.visibility, query.now))
}

impl PostgresPostRepository {
    /// Attach authors, categories, locations and comment counts to a batch
    /// of posts with one query per related table.
    async fn summarize(&self, models: Vec<post::Model>) -> Result<Vec<PostSummary>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Id> = models.iter().map(|m| m.id).collect();
        let mut author_ids: Vec<Id> = models.iter().map(|m| m.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let mut category_ids: Vec<Id> = models.iter().map(|m| m.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let mut location_ids: Vec<Id> = models.iter().filter_map(|m| m.location_id).collect();
        location_ids.sort_unstable();
        location_ids.dedup();

        let authors: HashMap<Id, User> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|m| (m.id, User::from(m)))
            .collect();

        let categories: HashMap<Id, Category> = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|m| (m.id, Category::from(m)))
            .collect();

        let locations: HashMap<Id, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| (m.id, Location::from(m)))
                .collect()
        };

        let counts: HashMap<Id, u64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|row| (row.post_id, u64::try_from(row.count).unwrap_or(0)))
            .collect();

        models
            .into_iter()
            .map(|model| {
                let post = Post::from(model);
                let author = authors
                    .get(&post.author_id)
                    .map(User::profile)
                    .ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;
                let category = categories
                    .get(&post.category_id)
                    .cloned()
                    .ok_or_else(|| RepoError::Query(format!("post {} has no category", post.id)))?;
                let location = post.location_id.and_then(|id| locations.get(&id).cloned());
                let comment_count = counts.get(&post.id).copied().unwrap_or(0);

                Ok(PostSummary {
                    post,
                    author,
                    category,
                    location,
                    comment_count,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        Ok(self.summarize(vec![model]).await?.into_iter().next())
    }

    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        tracing::debug!(scope = ?query.scope, page = page.number, "Listing posts");

        let paginator = PostEntity::find()
            .inner_join(CategoryEntity)
            .filter(listing_condition(query))
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, page.per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        if page.offset_within(total).is_none() {
            return Ok(Page::new(Vec::new(), page, total));
        }
        let models = paginator
            .fetch_page(page.number - 1)
            .await
            .map_err(map_db_err)?;

        let items = self.summarize(models).await?;
        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Id) -> Result<Vec<CommentView>, RepoError> {
        let rows = CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentView {
                comment: Comment::from(comment),
                author_username: author.map(|u| u.username).unwrap_or_default(),
            })
            .collect())
    }
}
