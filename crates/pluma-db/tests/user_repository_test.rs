//! Integration tests for the User repository using in-memory SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use pluma_auth::password::verify_password;
use pluma_core::error::PlumaError;
use pluma_core::models::post::{Category, CreatePost};
use pluma_core::models::user::{CreateUser, UpdateProfile};
use pluma_core::repository::{Pagination, PostRepository, UserRepository};
use pluma_db::repository::{SurrealPostRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

/// Helper: spin up an in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pluma_db::run_migrations(&db).await.unwrap();
    db
}

fn user_input(username: &str) -> CreateUser {
    CreateUser {
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
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(user_input("alice")).await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert!(user.terms_accepted);
    assert!(user.followers.is_empty());
    assert!(user.following.is_empty());
    assert!(user.bookmarks.is_empty());
    assert_eq!(user.follower_count, 0);
    assert_eq!(user.following_count, 0);
    assert_eq!(user.post_count, 0);
    assert!(user.reset_token_hash.is_none());
    assert!(user.reset_token_expires_at.is_none());

    // Password should be hashed, not stored in plaintext.
    assert_ne!(user.password_hash, "SuperSecret123!");
    assert!(user.password_hash.starts_with("$argon2id$"));

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice");

    let by_name = repo.get_by_username("alice").await.unwrap();
    assert_eq!(by_name.id, user.id);
}

#[tokio::test]
async fn login_lookup_matches_email_or_username() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(user_input("bob")).await.unwrap();

    assert_eq!(repo.get_by_login("bob").await.unwrap().id, user.id);
    assert_eq!(
        repo.get_by_login("bob@example.com").await.unwrap().id,
        user.id
    );
    assert!(matches!(
        repo.get_by_login("nobody").await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}

#[tokio::test]
async fn password_verification() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(user_input("carol")).await.unwrap();

    assert!(verify_password("SuperSecret123!", &user.password_hash, None).unwrap());
    assert!(!verify_password("WrongPassword", &user.password_hash, None).unwrap());
}

#[tokio::test]
async fn uniqueness_probe_sees_username_and_email() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    repo.create(user_input("dave")).await.unwrap();

    assert!(
        repo.username_or_email_taken("dave", "other@example.com")
            .await
            .unwrap()
    );
    assert!(
        repo.username_or_email_taken("other", "dave@example.com")
            .await
            .unwrap()
    );
    assert!(
        !repo
            .username_or_email_taken("other", "other@example.com")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn profile_update_sets_and_clears_fields() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(user_input("erin")).await.unwrap();

    let updated = repo
        .update_profile(
            user.id,
            UpdateProfile {
                bio: Some(Some("Writes about systems.".into())),
                social_links: Some(vec!["https://example.com/erin".into()]),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("Writes about systems."));
    assert_eq!(updated.social_links.len(), 1);

    let cleared = repo
        .update_profile(
            user.id,
            UpdateProfile {
                bio: Some(None),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.bio.is_none());
    // Untouched fields survive.
    assert_eq!(cleared.social_links.len(), 1);
}

#[tokio::test]
async fn reset_token_window_and_single_use() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(user_input("frank")).await.unwrap();

    let digest = "a".repeat(64);
    repo.set_reset_token(user.id, &digest, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    let holder = repo.get_by_reset_token(&digest, Utc::now()).await.unwrap();
    assert_eq!(holder.id, user.id);

    // Consuming the token clears both fields in the same write.
    repo.reset_password(user.id, "NewPassword99!").await.unwrap();
    let after = repo.get_by_id(user.id).await.unwrap();
    assert!(after.reset_token_hash.is_none());
    assert!(after.reset_token_expires_at.is_none());
    assert!(verify_password("NewPassword99!", &after.password_hash, None).unwrap());

    assert!(matches!(
        repo.get_by_reset_token(&digest, Utc::now()).await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}

#[tokio::test]
async fn expired_reset_token_is_invisible() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(user_input("grace")).await.unwrap();

    let digest = "b".repeat(64);
    repo.set_reset_token(user.id, &digest, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    assert!(matches!(
        repo.get_by_reset_token(&digest, Utc::now()).await.unwrap_err(),
        PlumaError::NotFound { .. }
    ));
}

#[tokio::test]
async fn follow_toggle_mirrors_sets_and_counters() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let alice = repo.create(user_input("alice")).await.unwrap();
    let bob = repo.create(user_input("bob")).await.unwrap();

    // First toggle: followed.
    assert!(repo.toggle_follow(alice.id, bob.id).await.unwrap());
    let a = repo.get_by_id(alice.id).await.unwrap();
    let b = repo.get_by_id(bob.id).await.unwrap();
    assert!(a.following.contains(&bob.id));
    assert!(b.followers.contains(&alice.id));
    assert_eq!(a.following_count, a.following.len() as u64);
    assert_eq!(b.follower_count, b.followers.len() as u64);
    assert_eq!(a.following_count, 1);
    assert_eq!(b.follower_count, 1);
    assert!(repo.is_following(alice.id, bob.id).await.unwrap());

    // Second toggle: back to the original state (involution).
    assert!(!repo.toggle_follow(alice.id, bob.id).await.unwrap());
    let a = repo.get_by_id(alice.id).await.unwrap();
    let b = repo.get_by_id(bob.id).await.unwrap();
    assert!(a.following.is_empty());
    assert!(b.followers.is_empty());
    assert_eq!(a.following_count, 0);
    assert_eq!(b.follower_count, 0);
    assert!(!repo.is_following(alice.id, bob.id).await.unwrap());

    // Third toggle: set semantics — still exactly one entry.
    assert!(repo.toggle_follow(alice.id, bob.id).await.unwrap());
    let a = repo.get_by_id(alice.id).await.unwrap();
    assert_eq!(a.following.len(), 1);
    assert_eq!(a.following_count, 1);
}

#[tokio::test]
async fn bookmark_toggle_pairs_set_and_counter() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let posts = SurrealPostRepository::new(db);
    let alice = users.create(user_input("alice")).await.unwrap();
    let bob = users.create(user_input("bob")).await.unwrap();
    let post = posts
        .create(CreatePost {
            title: "Intro to Rust".into(),
            content: "Ownership and borrowing.".into(),
            category: Category::Technology,
            author: bob.id,
            image: None,
            tags: vec![],
        })
        .await
        .unwrap();

    assert!(users.toggle_bookmark(alice.id, post.id).await.unwrap());
    let a = users.get_by_id(alice.id).await.unwrap();
    let p = posts.get_by_id(post.id).await.unwrap();
    assert!(a.bookmarks.contains(&post.id));
    assert_eq!(p.bookmarks_count, 1);

    assert!(!users.toggle_bookmark(alice.id, post.id).await.unwrap());
    let a = users.get_by_id(alice.id).await.unwrap();
    let p = posts.get_by_id(post.id).await.unwrap();
    assert!(a.bookmarks.is_empty());
    assert_eq!(p.bookmarks_count, 0);
}

#[tokio::test]
async fn search_matches_username_and_full_name() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    repo.create(user_input("alice")).await.unwrap();
    repo.create(user_input("bob")).await.unwrap();

    let hits = repo.search(Some("ALI"), 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "alice");

    // Full-name match.
    let hits = repo.search(Some("bob example"), 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "bob");

    // No query lists everyone, bounded.
    let all = repo.search(None, 10).await.unwrap();
    assert_eq!(all.len(), 2);
    let one = repo.search(None, 1).await.unwrap();
    assert_eq!(one.len(), 1);
}

#[tokio::test]
async fn list_paginates() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    for name in ["alice", "bob", "carol"] {
        repo.create(user_input(name)).await.unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let rest = repo
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);

    assert_eq!(repo.count().await.unwrap(), 3);
}
