//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Compound mutations (follow and
//! bookmark toggles, comment creation, cascading deletes) are atomic:
//! an implementation must not let a caller observe a set and its
//! denormalized counter out of step.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PlumaResult;
use crate::models::{
    comment::{Comment, CommentView, CreateComment},
    post::{CreatePost, Post, PostFilter, PostView, UpdatePost},
    user::{CreateUser, PublicProfile, UpdateProfile, User, UserSummary},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = PlumaResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PlumaResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = PlumaResult<User>> + Send;
    /// Lookup by exact match on email OR username.
    fn get_by_login(
        &self,
        email_or_username: &str,
    ) -> impl Future<Output = PlumaResult<User>> + Send;
    /// True if any user already holds this username or email
    /// (case-sensitive exact match).
    fn username_or_email_taken(
        &self,
        username: &str,
        email: &str,
    ) -> impl Future<Output = PlumaResult<bool>> + Send;
    fn update_profile(
        &self,
        id: Uuid,
        input: UpdateProfile,
    ) -> impl Future<Output = PlumaResult<User>> + Send;
    /// Public projections for the given ids, in id order. Unknown ids
    /// are skipped.
    fn profiles_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = PlumaResult<Vec<PublicProfile>>> + Send;
    /// Case-insensitive substring search on username or full name.
    /// `None` lists the most recently joined users.
    fn search(
        &self,
        query: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = PlumaResult<Vec<UserSummary>>> + Send;

    /// Open a password-reset window: store the token digest and expiry.
    fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = PlumaResult<()>> + Send;
    /// Find the user holding this exact token digest with an unexpired
    /// window.
    fn get_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = PlumaResult<User>> + Send;
    /// Store a new password hash and close the reset window in the
    /// same write (single-use tokens).
    fn reset_password(
        &self,
        id: Uuid,
        new_password: &str,
    ) -> impl Future<Output = PlumaResult<()>> + Send;

    /// Atomically toggle the follow edge between two users, keeping
    /// both reference sets and both counters consistent. Returns the
    /// new state: `true` if the follower now follows the target.
    fn toggle_follow(
        &self,
        follower: Uuid,
        target: Uuid,
    ) -> impl Future<Output = PlumaResult<bool>> + Send;
    fn is_following(
        &self,
        follower: Uuid,
        target: Uuid,
    ) -> impl Future<Output = PlumaResult<bool>> + Send;

    /// Atomically toggle a bookmark, pairing the user's set mutation
    /// with the post's `bookmarks_count` delta. Returns the new state.
    fn toggle_bookmark(
        &self,
        user: Uuid,
        post: Uuid,
    ) -> impl Future<Output = PlumaResult<bool>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PlumaResult<PaginatedResult<User>>> + Send;
    /// Delete the user and cascade: their posts, comments on those
    /// posts, their comments anywhere, and every reference to any of
    /// the deleted ids held by other users or posts.
    fn delete_cascade(&self, id: Uuid) -> impl Future<Output = PlumaResult<()>> + Send;
    fn count(&self) -> impl Future<Output = PlumaResult<u64>> + Send;
}

pub trait PostRepository: Send + Sync {
    /// Persist a new post. Derives `slug` and `reading_time`, and
    /// increments the author's `post_count` in the same transaction.
    fn create(&self, input: CreatePost) -> impl Future<Output = PlumaResult<Post>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PlumaResult<Post>> + Send;
    /// Full view with author, likes, and comments expanded.
    fn get_view(&self, id: Uuid) -> impl Future<Output = PlumaResult<PostView>> + Send;
    /// Apply edits. Re-derives `reading_time` when content changes and
    /// `slug` when the title changes.
    fn update(
        &self,
        id: Uuid,
        input: UpdatePost,
    ) -> impl Future<Output = PlumaResult<Post>> + Send;
    /// Delete the post and cascade: its comments, its id in any user's
    /// bookmarks, and the author's `post_count`.
    fn delete_cascade(&self, id: Uuid) -> impl Future<Output = PlumaResult<()>> + Send;

    fn list(
        &self,
        filter: &PostFilter,
        limit: usize,
    ) -> impl Future<Output = PlumaResult<Vec<Post>>> + Send;
    /// Published posts by one author, newest first (profile pages).
    fn list_by_author(
        &self,
        author: Uuid,
        limit: usize,
    ) -> impl Future<Output = PlumaResult<Vec<Post>>> + Send;
    /// Posts for the given ids, returned in id order (reading lists).
    /// Unknown ids are skipped.
    fn list_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = PlumaResult<Vec<Post>>> + Send;
    /// Published posts by any of the given authors, newest first.
    fn feed(
        &self,
        authors: &[Uuid],
        limit: usize,
    ) -> impl Future<Output = PlumaResult<Vec<Post>>> + Send;
    /// Published posts sharing the source post's category, excluding
    /// the source, newest first.
    fn recommendations(
        &self,
        post_id: Uuid,
        limit: usize,
    ) -> impl Future<Output = PlumaResult<Vec<Post>>> + Send;

    /// Atomically toggle the user's membership in `likes` and return
    /// the updated post.
    fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = PlumaResult<Post>> + Send;
    /// Monotonic view counter; the key may be the id or the slug.
    fn increment_view(&self, id_or_slug: &str) -> impl Future<Output = PlumaResult<u64>> + Send;
    /// Monotonic share counter; the key may be the id or the slug.
    fn increment_share(&self, id_or_slug: &str) -> impl Future<Output = PlumaResult<u64>> + Send;

    fn toggle_publish(&self, id: Uuid) -> impl Future<Output = PlumaResult<Post>> + Send;
    fn count(&self) -> impl Future<Output = PlumaResult<u64>> + Send;
}

pub trait CommentRepository: Send + Sync {
    /// Persist a comment and append its reference to the post's
    /// comment list in the same transaction (insertion order).
    fn create(&self, input: CreateComment) -> impl Future<Output = PlumaResult<Comment>> + Send;
    /// Comments on a post with authors expanded, newest first.
    fn list_for_post(
        &self,
        post_id: Uuid,
    ) -> impl Future<Output = PlumaResult<Vec<CommentView>>> + Send;
    fn count(&self) -> impl Future<Output = PlumaResult<u64>> + Send;
}
