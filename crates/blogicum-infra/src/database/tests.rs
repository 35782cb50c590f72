use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sea_orm::{
    DatabaseBackend, DbErr, EntityTrait, MockDatabase, MockExecResult, QueryFilter, QuerySelect,
    QueryTrait, Value,
};

use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::{ListingScope, PostQuery, PostVisibility, Viewer};
use blogicum_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

use super::entity::{category, comment, post, user};
use super::postgres_base::map_db_err;
use super::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository, listing_condition,
};

fn user_model(id: i64, username: &str) -> user::Model {
    user::Model {
        id,
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "hash".to_owned(),
        date_joined: Utc::now().into(),
    }
}

fn category_model(id: i64) -> category::Model {
    category::Model {
        id,
        title: "Travel".to_owned(),
        description: "Trips".to_owned(),
        slug: "travel".to_owned(),
        is_published: true,
        created_at: Utc::now().into(),
    }
}

fn post_model(id: i64, author_id: i64) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        title: "Test Post".to_owned(),
        text: "Content".to_owned(),
        pub_date: (now - Duration::hours(1)).into(),
        is_published: true,
        author_id,
        category_id: 1,
        location_id: None,
        created_at: now.into(),
    }
}

/// The WHERE clause of a listing query, without the selected columns.
fn listing_sql(query: &PostQuery) -> String {
    let sql = post::Entity::find()
        .inner_join(category::Entity)
        .filter(listing_condition(query))
        .build(DatabaseBackend::Postgres)
        .to_string();
    sql.split_once(" WHERE ")
        .map(|(_, clause)| clause.to_owned())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_find_post_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(5, 1)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: blogicum_core::domain::Post = repo.find_by_id(5).await.unwrap().unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, 5);
    assert_eq!(post.location_id, None);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user_model(3, "alice")]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let user = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.email, "alice@example.com");
}

#[tokio::test]
async fn test_find_summary_attaches_related_rows() {
    let count_row = BTreeMap::from([
        ("post_id", Value::BigInt(Some(5))),
        ("count", Value::BigInt(Some(2))),
    ]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(5, 3)]])
        .append_query_results(vec![vec![user_model(3, "alice")]])
        .append_query_results(vec![vec![category_model(1)]])
        .append_query_results(vec![vec![count_row]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let summary = repo.find_summary(5).await.unwrap().unwrap();
    assert_eq!(summary.author.username, "alice");
    assert_eq!(summary.category.slug, "travel");
    assert!(summary.location.is_none());
    assert_eq!(summary.comment_count, 2);
}

#[tokio::test]
async fn test_find_summary_of_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.find_summary(404).await.unwrap().is_none());
}

#[tokio::test]
async fn test_comments_come_with_author_names() {
    let now = Utc::now();
    let row = (
        comment::Model {
            id: 11,
            text: "Nice".to_owned(),
            post_id: 5,
            author_id: 3,
            created_at: now.into(),
        },
        user_model(3, "alice"),
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let comments = repo.list_for_post(5).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_username, "alice");
    assert_eq!(comments[0].comment.text, "Nice");
}

#[tokio::test]
async fn test_delete_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<blogicum_core::domain::Post, i64>::delete(&repo, 9).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[test]
fn test_record_not_updated_maps_to_not_found() {
    assert!(matches!(
        map_db_err(DbErr::RecordNotUpdated),
        RepoError::NotFound
    ));
    assert!(matches!(
        map_db_err(DbErr::Custom("boom".into())),
        RepoError::Query(_)
    ));
}

#[test]
fn test_anonymous_listing_only_matches_public_posts() {
    let query = PostQuery::new(
        ListingScope::Index,
        PostVisibility::for_viewer(&Viewer::Anonymous),
        Utc::now(),
    );
    let sql = listing_sql(&query);

    assert!(sql.contains(r#""posts"."is_published" = TRUE"#), "{sql}");
    assert!(sql.contains(r#""categories"."is_published" = TRUE"#), "{sql}");
    assert!(sql.contains(r#""posts"."pub_date" <="#), "{sql}");
    assert!(!sql.contains(r#""posts"."author_id""#), "{sql}");
}

#[test]
fn test_authenticated_listing_includes_own_posts() {
    let query = PostQuery::new(
        ListingScope::Category(4),
        PostVisibility::for_viewer(&Viewer::user(3, "alice")),
        Utc::now(),
    );
    let sql = listing_sql(&query);

    assert!(sql.contains(r#""posts"."category_id" = 4"#), "{sql}");
    assert!(sql.contains(r#""posts"."author_id" = 3 OR"#), "{sql}");
}

#[test]
fn test_owner_profile_listing_is_unfiltered() {
    let query = PostQuery::new(ListingScope::Profile(3), PostVisibility::Everything, Utc::now());
    let sql = listing_sql(&query);

    assert!(sql.contains(r#""posts"."author_id" = 3"#), "{sql}");
    assert!(!sql.contains("is_published"), "{sql}");
}

#[tokio::test]
async fn test_page_past_the_end_only_counts() {
    let count_row = BTreeMap::from([("num_items", Value::BigInt(Some(3)))]);

    // No rows are queued for a page fetch; issuing one would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let query = PostQuery::new(
        ListingScope::Index,
        PostVisibility::for_viewer(&Viewer::Anonymous),
        Utc::now(),
    );

    let page = repo
        .list(&query, PageRequest::new(u64::MAX, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 3);
    assert!(page.is_out_of_range());
}
