//! Content catalog service — post authoring, listing, and
//! recommendations.

use pluma_core::error::{PlumaError, PlumaResult};
use pluma_core::models::post::{Category, CreatePost, Post, PostFilter, PostView, UpdatePost};
use pluma_core::repository::{PostRepository, UserRepository};
use uuid::Uuid;

/// Recommendations returned per post.
const RECOMMENDATION_LIMIT: usize = 5;

/// Catalog listing page size.
const LIST_LIMIT: usize = 50;

/// Input for post creation. `category` arrives as its wire value and
/// is validated against the closed enum before anything is written.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author_username: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

/// Content catalog service.
pub struct CatalogService<U: UserRepository, P: PostRepository> {
    users: U,
    posts: P,
}

impl<U: UserRepository, P: PostRepository> CatalogService<U, P> {
    pub fn new(users: U, posts: P) -> Self {
        Self { users, posts }
    }

    /// Create a post. `slug` and `reading_time` are derived by the
    /// repository, never supplied by the caller.
    pub async fn create_post(&self, input: NewPost) -> PlumaResult<PostView> {
        // 1. Required fields.
        if input.title.trim().is_empty()
            || input.content.trim().is_empty()
            || input.category.trim().is_empty()
            || input.author_username.trim().is_empty()
        {
            return Err(PlumaError::validation(
                "Title, content, category, and author are required",
            ));
        }

        // 2. Closed category enum — a hard rule.
        let category = Category::parse(&input.category).ok_or_else(|| {
            PlumaError::validation(format!(
                "Invalid category '{}'. Must be one of: {}",
                input.category,
                Category::ALL.map(|c| c.as_str()).join(", ")
            ))
        })?;

        // 3. Resolve the author.
        let author = self.users.get_by_username(&input.author_username).await?;

        // 4. Persist and return the expanded view.
        let post = self
            .posts
            .create(CreatePost {
                title: input.title,
                content: input.content,
                category,
                author: author.id,
                image: input.image,
                tags: input.tags,
            })
            .await?;

        self.posts.get_view(post.id).await
    }

    /// A single post with author, likes, and comments expanded.
    pub async fn get_post(&self, id: Uuid) -> PlumaResult<PostView> {
        self.posts.get_view(id).await
    }

    /// Apply edits to a post.
    pub async fn update_post(&self, id: Uuid, input: UpdatePost) -> PlumaResult<Post> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(PlumaError::validation("Title must not be empty"));
            }
        }
        if let Some(content) = &input.content {
            if content.trim().is_empty() {
                return Err(PlumaError::validation("Content must not be empty"));
            }
        }
        self.posts.update(id, input).await
    }

    /// Owner-initiated delete. Cascades exactly like a moderation
    /// delete: comments go, bookmark references and counters are
    /// cleaned up.
    pub async fn delete_post(&self, id: Uuid, acting_username: &str) -> PlumaResult<()> {
        let post = self.posts.get_by_id(id).await?;
        let actor = self.users.get_by_username(acting_username).await?;
        if post.author != actor.id {
            return Err(PlumaError::Auth {
                reason: "Only the author can delete this post".into(),
            });
        }
        self.posts.delete_cascade(id).await
    }

    /// Filtered, sorted listing. This surface only ever returns
    /// published posts.
    pub async fn list_posts(&self, filter: PostFilter) -> PlumaResult<Vec<Post>> {
        let filter = PostFilter {
            include_unpublished: false,
            ..filter
        };
        self.posts.list(&filter, LIST_LIMIT).await
    }

    /// Up to five published posts sharing the source post's category,
    /// newest first. Recommendations are category-only; tags carry no
    /// weight.
    pub async fn recommendations(&self, post_id: Uuid) -> PlumaResult<Vec<Post>> {
        self.posts
            .recommendations(post_id, RECOMMENDATION_LIMIT)
            .await
    }
}
