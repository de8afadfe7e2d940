//! Integration tests for the Comment repository using in-memory
//! SurrealDB.

use chrono::{TimeZone, Utc};
use pluma_core::models::comment::CreateComment;
use pluma_core::models::post::{Category, CreatePost};
use pluma_core::models::user::CreateUser;
use pluma_core::repository::{CommentRepository, PostRepository, UserRepository};
use pluma_db::repository::{
    SurrealCommentRepository, SurrealPostRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Helper: in-memory DB with one author and one post.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pluma_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let author = users
        .create(CreateUser {
            full_name: "Bob Example".into(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "SuperSecret123!".into(),
            dob: Utc.with_ymd_and_hms(1991, 2, 2, 0, 0, 0).unwrap(),
            gender: None,
            bio: None,
            profile_pic: None,
            category: None,
            country: None,
            terms_accepted: true,
        })
        .await
        .unwrap();

    let posts = SurrealPostRepository::new(db.clone());
    let post = posts
        .create(CreatePost {
            title: "Commentable".into(),
            content: "Please discuss.".into(),
            category: Category::Lifestyle,
            author: author.id,
            image: None,
            tags: vec![],
        })
        .await
        .unwrap();

    (db, author.id, post.id)
}

#[tokio::test]
async fn create_appends_to_post_in_insertion_order() {
    let (db, author, post_id) = setup().await;
    let comments = SurrealCommentRepository::new(db.clone());
    let posts = SurrealPostRepository::new(db);

    let first = comments
        .create(CreateComment {
            content: "first!".into(),
            author,
            post: post_id,
        })
        .await
        .unwrap();
    assert_eq!(first.author, author);
    assert_eq!(first.post, post_id);

    let second = comments
        .create(CreateComment {
            content: "second thoughts".into(),
            author,
            post: post_id,
        })
        .await
        .unwrap();

    // The post's reference list grows by exactly one per comment and
    // the first comment stays first.
    let post = posts.get_by_id(post_id).await.unwrap();
    assert_eq!(post.comments, vec![first.id, second.id]);
}

#[tokio::test]
async fn list_for_post_is_newest_first_with_authors() {
    let (db, author, post_id) = setup().await;
    let comments = SurrealCommentRepository::new(db);

    comments
        .create(CreateComment {
            content: "older".into(),
            author,
            post: post_id,
        })
        .await
        .unwrap();
    comments
        .create(CreateComment {
            content: "newer".into(),
            author,
            post: post_id,
        })
        .await
        .unwrap();

    let views = comments.list_for_post(post_id).await.unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].content, "newer");
    assert_eq!(views[1].content, "older");
    assert_eq!(views[0].author.username, "bob");

    // Other posts' comments are not included.
    let none = comments.list_for_post(Uuid::new_v4()).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn count_tracks_total_comments() {
    let (db, author, post_id) = setup().await;
    let comments = SurrealCommentRepository::new(db);

    assert_eq!(comments.count().await.unwrap(), 0);
    comments
        .create(CreateComment {
            content: "one".into(),
            author,
            post: post_id,
        })
        .await
        .unwrap();
    assert_eq!(comments.count().await.unwrap(), 1);
}
