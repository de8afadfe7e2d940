//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    /// Profile bio, at most 500 characters.
    pub bio: Option<String>,
    pub dob: DateTime<Utc>,
    pub gender: Option<String>,
    pub country: Option<String>,
    /// Interest category chosen at signup (free-form, unlike post categories).
    pub category: Option<String>,
    pub profile_pic: Option<String>,
    pub social_links: Vec<String>,
    pub terms_accepted: bool,
    /// Users following this user.
    pub followers: Vec<Uuid>,
    /// Users this user follows.
    pub following: Vec<Uuid>,
    /// Bookmarked posts, in bookmark order.
    pub bookmarks: Vec<Uuid>,
    /// Denormalized; always equals `followers.len()` after any operation.
    pub follower_count: u64,
    /// Denormalized; always equals `following.len()` after any operation.
    pub following_count: u64,
    pub post_count: u64,
    /// SHA-256 digest of the outstanding reset token. Non-null only
    /// together with `reset_token_expires_at` during an open window.
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    /// Raw password (will be hashed with Argon2id before storage).
    pub password: String,
    pub dob: DateTime<Utc>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub terms_accepted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub bio: Option<Option<String>>,
    pub gender: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub profile_pic: Option<Option<String>>,
    pub social_links: Option<Vec<String>>,
}

/// Minimal public identity, used wherever another user is expanded
/// (followers, likes, comment authors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_pic: Option<String>,
}

/// Search-result projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub follower_count: u64,
}

/// Moderation-surface projection: everything an administrator sees,
/// credentials and reset state omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub country: Option<String>,
    pub terms_accepted: bool,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AccountView {
    fn from(user: User) -> Self {
        AccountView {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            country: user.country,
            terms_accepted: user.terms_accepted,
            follower_count: user.follower_count,
            following_count: user.following_count,
            post_count: user.post_count,
            created_at: user.created_at,
        }
    }
}

/// A user's public profile page: identity, expanded graph edges, and
/// denormalized counts. Credentials and reset state never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub country: Option<String>,
    pub profile_pic: Option<String>,
    pub social_links: Vec<String>,
    pub followers: Vec<PublicProfile>,
    pub following: Vec<PublicProfile>,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    pub created_at: DateTime<Utc>,
}
