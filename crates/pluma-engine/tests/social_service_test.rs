//! Integration tests for the social graph service, wired over the
//! real SurrealDB repositories (in-memory engine).

use chrono::{TimeZone, Utc};
use pluma_core::error::PlumaError;
use pluma_core::models::post::{Category, CreatePost};
use pluma_core::models::user::{CreateUser, UpdateProfile, User};
use pluma_core::repository::{PostRepository, UserRepository};
use pluma_db::repository::{SurrealPostRepository, SurrealUserRepository};
use pluma_engine::SocialService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Service = SocialService<SurrealUserRepository<Db>, SurrealPostRepository<Db>>;

async fn setup() -> (Surreal<Db>, Service) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pluma_db::run_migrations(&db).await.unwrap();

    let service = SocialService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealPostRepository::new(db.clone()),
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

async fn seed_post(db: &Surreal<Db>, title: &str, author: Uuid) -> pluma_core::models::post::Post {
    SurrealPostRepository::new(db.clone())
        .create(CreatePost {
            title: title.into(),
            content: "Some worthwhile words.".into(),
            category: Category::Technology,
            author,
            image: None,
            tags: vec![],
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn follow_toggles_and_keeps_the_graph_consistent() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    assert!(service.follow("alice", bob.id).await.unwrap());
    assert!(service.follow_status("alice", bob.id).await.unwrap());

    let users = SurrealUserRepository::new(db.clone());
    let a = users.get_by_id(alice.id).await.unwrap();
    let b = users.get_by_id(bob.id).await.unwrap();
    assert!(a.following.contains(&bob.id));
    assert!(b.followers.contains(&alice.id));
    assert_eq!(b.follower_count, b.followers.len() as u64);

    // Involution: a second call returns to the original state.
    assert!(!service.follow("alice", bob.id).await.unwrap());
    assert!(!service.follow_status("alice", bob.id).await.unwrap());
    let b = users.get_by_id(bob.id).await.unwrap();
    assert_eq!(b.follower_count, 0);
    assert!(b.followers.is_empty());
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;

    assert!(matches!(
        service.follow("alice", alice.id).await.unwrap_err(),
        PlumaError::Validation { .. }
    ));
}

#[tokio::test]
async fn follow_requires_both_sides_to_exist() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;

    assert!(matches!(
        service.follow("alice", Uuid::new_v4()).await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
    assert!(matches!(
        service.follow("nobody", alice.id).await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}

#[tokio::test]
async fn feed_is_restricted_to_followed_published_authors() {
    let (db, service) = setup().await;
    seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    let carol = seed_user(&db, "carol").await;

    let bob_post = seed_post(&db, "From bob", bob.id).await;
    let bob_draft = seed_post(&db, "Bob draft", bob.id).await;
    seed_post(&db, "From carol", carol.id).await;

    let posts = SurrealPostRepository::new(db.clone());
    posts.toggle_publish(bob_draft.id).await.unwrap();

    service.follow("alice", bob.id).await.unwrap();

    let feed = service.feed("alice").await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, bob_post.id);

    // Not following anyone means an empty feed.
    assert!(service.feed("carol").await.unwrap().is_empty());
}

#[tokio::test]
async fn profile_expands_edges_and_recent_posts() {
    let (db, service) = setup().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    seed_post(&db, "Alices post", alice.id).await;

    service.follow("bob", alice.id).await.unwrap();

    let page = service.profile("alice").await.unwrap();
    assert_eq!(page.profile.username, "alice");
    assert_eq!(page.profile.follower_count, 1);
    assert_eq!(page.profile.followers.len(), 1);
    assert_eq!(page.profile.followers[0].id, bob.id);
    assert_eq!(page.profile.post_count, 1);
    assert_eq!(page.posts.len(), 1);
}

#[tokio::test]
async fn profile_update_validates_and_applies() {
    let (db, service) = setup().await;
    seed_user(&db, "alice").await;

    let profile = service
        .update_profile(
            "alice",
            UpdateProfile {
                bio: Some(Some("Systems writer.".into())),
                social_links: Some(vec!["https://example.com/alice".into()]),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.bio.as_deref(), Some("Systems writer."));
    assert_eq!(profile.social_links.len(), 1);

    assert!(matches!(
        service
            .update_profile(
                "alice",
                UpdateProfile {
                    bio: Some(Some("x".repeat(501))),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap_err(),
        PlumaError::Validation { .. }
    ));
}

#[tokio::test]
async fn user_search_is_case_insensitive_and_bounded() {
    let (db, service) = setup().await;
    seed_user(&db, "alice").await;
    seed_user(&db, "alicia").await;
    seed_user(&db, "bob").await;

    let hits = service.search_users(Some("ALIC")).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|u| u.username.starts_with("alic")));

    let all = service.search_users(None).await.unwrap();
    assert_eq!(all.len(), 3);
}
