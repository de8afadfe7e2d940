//! Engagement service — likes, comments, bookmarks, and counters.

use pluma_core::error::{PlumaError, PlumaResult};
use pluma_core::models::comment::{CommentView, CreateComment};
use pluma_core::models::post::{Post, PostView};
use pluma_core::repository::{CommentRepository, PostRepository, UserRepository};
use uuid::Uuid;

/// Engagement service.
pub struct EngagementService<U, P, C>
where
    U: UserRepository,
    P: PostRepository,
    C: CommentRepository,
{
    users: U,
    posts: P,
    comments: C,
}

impl<U, P, C> EngagementService<U, P, C>
where
    U: UserRepository,
    P: PostRepository,
    C: CommentRepository,
{
    pub fn new(users: U, posts: P, comments: C) -> Self {
        Self {
            users,
            posts,
            comments,
        }
    }

    /// Toggle the user's like on a post and return the updated post
    /// with likes expanded.
    ///
    /// There is no separate like counter: `likes.len()` is the count,
    /// so the count cannot drift from the set.
    pub async fn toggle_like(&self, post_id: Uuid, username: &str) -> PlumaResult<PostView> {
        let user = self.users.get_by_username(username).await?;
        let post = self.posts.toggle_like(post_id, user.id).await?;
        self.posts.get_view(post.id).await
    }

    /// Author a comment against a post. The reference is appended to
    /// the end of the post's comment list — insertion order is
    /// preserved.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        content: &str,
        author_username: &str,
    ) -> PlumaResult<PostView> {
        if content.trim().is_empty() || author_username.trim().is_empty() {
            return Err(PlumaError::validation("Content and author are required"));
        }

        let author = self.users.get_by_username(author_username).await?;
        let post = self.posts.get_by_id(post_id).await?;

        self.comments
            .create(CreateComment {
                content: content.to_string(),
                author: author.id,
                post: post.id,
            })
            .await?;

        self.posts.get_view(post_id).await
    }

    /// Comments on a post with authors expanded, newest first.
    pub async fn comments(&self, post_id: Uuid) -> PlumaResult<Vec<CommentView>> {
        self.posts.get_by_id(post_id).await?;
        self.comments.list_for_post(post_id).await
    }

    /// Toggle a bookmark. The user's set mutation and the post's
    /// `bookmarks_count` delta are paired in the repository. Returns
    /// the new state: `true` when the post is now bookmarked.
    pub async fn toggle_bookmark(&self, post_id: Uuid, username: &str) -> PlumaResult<bool> {
        let user = self.users.get_by_username(username).await?;
        let post = self.posts.get_by_id(post_id).await?;
        self.users.toggle_bookmark(user.id, post.id).await
    }

    /// The user's reading list, in bookmark order.
    pub async fn reading_list(&self, username: &str) -> PlumaResult<Vec<Post>> {
        let user = self.users.get_by_username(username).await?;
        self.posts.list_by_ids(&user.bookmarks).await
    }

    /// Record a view. The key may be the post id or its slug.
    pub async fn record_view(&self, id_or_slug: &str) -> PlumaResult<u64> {
        self.posts.increment_view(id_or_slug).await
    }

    /// Record a share. The key may be the post id or its slug.
    pub async fn record_share(&self, id_or_slug: &str) -> PlumaResult<u64> {
        self.posts.increment_share(id_or_slug).await
    }
}
