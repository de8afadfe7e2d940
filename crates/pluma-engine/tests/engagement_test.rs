//! Integration tests for the engagement service, wired over the real
//! SurrealDB repositories (in-memory engine).

use chrono::{TimeZone, Utc};
use pluma_core::error::PlumaError;
use pluma_core::models::post::{Category, CreatePost, Post};
use pluma_core::models::user::{CreateUser, User};
use pluma_core::repository::{PostRepository, UserRepository};
use pluma_db::repository::{
    SurrealCommentRepository, SurrealPostRepository, SurrealUserRepository,
};
use pluma_engine::EngagementService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Service = EngagementService<
    SurrealUserRepository<Db>,
    SurrealPostRepository<Db>,
    SurrealCommentRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, Service) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pluma_db::run_migrations(&db).await.unwrap();

    let service = EngagementService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealPostRepository::new(db.clone()),
        SurrealCommentRepository::new(db.clone()),
    );
    (db, service)
}

async fn seed_user(db: &Surreal<Db>, username: &str) -> User {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            full_name: format!("{username} Example"),
            username: username.into(),
            email: format!("{username}@example.com"),
            password: "SuperSecret123!".into(),
            dob: Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap(),
            gender: None,
            bio: None,
            profile_pic: None,
            category: None,
            country: None,
            terms_accepted: true,
        })
        .await
        .unwrap()
}

async fn seed_post(db: &Surreal<Db>, title: &str, author: Uuid) -> Post {
    SurrealPostRepository::new(db.clone())
        .create(CreatePost {
            title: title.into(),
            content: "Some worthwhile words.".into(),
            category: Category::Food,
            author,
            image: None,
            tags: vec![],
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn like_toggle_expands_public_profiles() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let post = seed_post(&db, "Likeable", bob.id).await;

    let view = service.toggle_like(post.id, "alice").await.unwrap();
    assert_eq!(view.likes.len(), 1);
    assert_eq!(view.likes[0].id, alice.id);
    assert_eq!(view.likes[0].username, "alice");
    assert_eq!(view.author.username, "bob");

    // Toggling back empties the set; the count is the set length by
    // construction.
    let view = service.toggle_like(post.id, "alice").await.unwrap();
    assert!(view.likes.is_empty());

    assert!(matches!(
        service.toggle_like(post.id, "nobody").await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
    assert!(matches!(
        service.toggle_like(Uuid::new_v4(), "alice").await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}

#[tokio::test]
async fn comments_append_in_insertion_order() {
    let (db, service) = setup().await;
    seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let post = seed_post(&db, "Discussable", bob.id).await;

    let view = service
        .add_comment(post.id, "nice post", "alice")
        .await
        .unwrap();
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].content, "nice post");
    assert_eq!(view.comments[0].author.username, "alice");

    let view = service
        .add_comment(post.id, "second opinion", "bob")
        .await
        .unwrap();
    assert_eq!(view.comments.len(), 2);
    // First comment stays first after a second is added.
    assert_eq!(view.comments[0].content, "nice post");
    assert_eq!(view.comments[1].content, "second opinion");
}

#[tokio::test]
async fn comment_validation_and_references() {
    let (db, service) = setup().await;
    let bob = seed_user(&db, "bob").await;
    let post = seed_post(&db, "Strict", bob.id).await;

    assert!(matches!(
        service.add_comment(post.id, "", "bob").await.unwrap_err(),
        PlumaError::Validation { .. }
    ));
    assert!(matches!(
        service.add_comment(post.id, "hello", "").await.unwrap_err(),
        PlumaError::Validation { .. }
    ));
    assert!(matches!(
        service
            .add_comment(post.id, "hello", "nobody")
            .await
            .unwrap_err(),
        PlumaError::NotFound { .. }
    ));
    assert!(matches!(
        service
            .add_comment(Uuid::new_v4(), "hello", "bob")
            .await
            .unwrap_err(),
        PlumaError::NotFound { .. }
    ));

    // The newest-first listing surface.
    service.add_comment(post.id, "older", "bob").await.unwrap();
    service.add_comment(post.id, "newer", "bob").await.unwrap();
    let listed = service.comments(post.id).await.unwrap();
    assert_eq!(listed[0].content, "newer");
}

#[tokio::test]
async fn bookmark_toggle_and_reading_list_order() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let first = seed_post(&db, "First find", bob.id).await;
    let second = seed_post(&db, "Second find", bob.id).await;

    assert!(service.toggle_bookmark(first.id, "alice").await.unwrap());
    assert!(service.toggle_bookmark(second.id, "alice").await.unwrap());

    // Reading list preserves bookmark order.
    let list = service.reading_list("alice").await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, first.id);
    assert_eq!(list[1].id, second.id);

    // The denormalized counter tracks the toggle.
    let posts = SurrealPostRepository::new(db.clone());
    assert_eq!(posts.get_by_id(first.id).await.unwrap().bookmarks_count, 1);

    assert!(!service.toggle_bookmark(first.id, "alice").await.unwrap());
    assert_eq!(posts.get_by_id(first.id).await.unwrap().bookmarks_count, 0);
    let list = service.reading_list("alice").await.unwrap();
    assert_eq!(list.len(), 1);

    let users = SurrealUserRepository::new(db);
    let a = users.get_by_id(alice.id).await.unwrap();
    assert_eq!(a.bookmarks, vec![second.id]);
}

#[tokio::test]
async fn view_and_share_counters_accept_slug_or_id() {
    let (db, service) = setup().await;
    let bob = seed_user(&db, "bob").await;
    let post = seed_post(&db, "Countable", bob.id).await;

    assert_eq!(service.record_view(&post.slug).await.unwrap(), 1);
    assert_eq!(service.record_view(&post.id.to_string()).await.unwrap(), 2);
    assert_eq!(service.record_share(&post.id.to_string()).await.unwrap(), 1);

    assert!(matches!(
        service.record_view("missing-slug").await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}
