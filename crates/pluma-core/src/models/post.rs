//! Post domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::comment::CommentView;
use crate::models::user::PublicProfile;

/// The closed set of post categories. Anything outside this set is a
/// hard validation failure, not a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Lifestyle,
    Travel,
    Food,
    Health,
    Business,
    Entertainment,
    Education,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Lifestyle,
        Category::Travel,
        Category::Food,
        Category::Health,
        Category::Business,
        Category::Entertainment,
        Category::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Lifestyle => "lifestyle",
            Category::Travel => "travel",
            Category::Food => "food",
            Category::Health => "health",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Education => "education",
        }
    }

    /// Parse the wire representation. Returns `None` for anything
    /// outside the closed set.
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "technology" => Some(Category::Technology),
            "lifestyle" => Some(Category::Lifestyle),
            "travel" => Some(Category::Travel),
            "food" => Some(Category::Food),
            "health" => Some(Category::Health),
            "business" => Some(Category::Business),
            "entertainment" => Some(Category::Entertainment),
            "education" => Some(Category::Education),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// URL-safe unique identifier, derived from the title.
    pub slug: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub author: Uuid,
    pub is_published: bool,
    /// Users who liked this post; set semantics, `likes.len()` is the
    /// like count.
    pub likes: Vec<Uuid>,
    /// Comment references in insertion order.
    pub comments: Vec<Uuid>,
    pub view_count: u64,
    pub share_count: u64,
    /// Denormalized count of users holding this post in `bookmarks`.
    pub bookmarks_count: u64,
    /// Estimated minutes to read, derived from the content.
    pub reading_time: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author: Uuid,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    /// Newest first (creation time).
    #[default]
    Newest,
    /// Views, then likes, then recency.
    Trending,
    /// Shares, then likes.
    Popular,
}

/// Catalog listing filters. All filters compose; text matching is
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Substring match across title, content, and tags.
    pub q: Option<String>,
    /// Exact match against any tag.
    pub tag: Option<String>,
    pub category: Option<Category>,
    pub sort: PostSort,
    /// Moderation surface only; regular callers see published posts.
    pub include_unpublished: bool,
}

/// A post with its references expanded to public projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub author: PublicProfile,
    pub is_published: bool,
    pub likes: Vec<PublicProfile>,
    pub comments: Vec<CommentView>,
    pub view_count: u64,
    pub share_count: u64,
    pub bookmarks_count: u64,
    pub reading_time: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
