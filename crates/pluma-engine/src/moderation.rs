//! Moderation service — the administrative surface.
//!
//! Authorization is a bearer-token check owned by the transport (see
//! `pluma_auth::token::validate_admin_token`); this service assumes
//! the caller already passed it.

use pluma_core::error::PlumaResult;
use pluma_core::models::post::{Post, PostFilter};
use pluma_core::models::user::AccountView;
use pluma_core::repository::{
    CommentRepository, PaginatedResult, Pagination, PostRepository, UserRepository,
};
use uuid::Uuid;

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy)]
pub struct SiteStats {
    pub users: u64,
    pub posts: u64,
    pub comments: u64,
}

/// Moderation service.
pub struct ModerationService<U, P, C>
where
    U: UserRepository,
    P: PostRepository,
    C: CommentRepository,
{
    users: U,
    posts: P,
    comments: C,
}

impl<U, P, C> ModerationService<U, P, C>
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

    /// All accounts, credentials and reset state omitted.
    pub async fn list_users(
        &self,
        pagination: Pagination,
    ) -> PlumaResult<PaginatedResult<AccountView>> {
        let page = self.users.list(pagination).await?;
        Ok(PaginatedResult {
            items: page.items.into_iter().map(AccountView::from).collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Delete a user and everything that references them: their
    /// posts, comments on those posts, their comments anywhere, and
    /// their id in every other user's graph and bookmark sets.
    pub async fn delete_user(&self, id: Uuid) -> PlumaResult<()> {
        // Resolve first so a missing id surfaces as NotFound rather
        // than an empty cascade.
        self.users.get_by_id(id).await?;
        self.users.delete_cascade(id).await
    }

    /// All posts, drafts included, newest first.
    pub async fn list_posts(&self, limit: usize) -> PlumaResult<Vec<Post>> {
        let filter = PostFilter {
            include_unpublished: true,
            ..PostFilter::default()
        };
        self.posts.list(&filter, limit).await
    }

    /// Delete a post with the full cascade.
    pub async fn delete_post(&self, id: Uuid) -> PlumaResult<()> {
        self.posts.get_by_id(id).await?;
        self.posts.delete_cascade(id).await
    }

    /// Flip a post's published flag.
    pub async fn toggle_publish(&self, id: Uuid) -> PlumaResult<Post> {
        self.posts.toggle_publish(id).await
    }

    /// Aggregate entity counts.
    pub async fn stats(&self) -> PlumaResult<SiteStats> {
        Ok(SiteStats {
            users: self.users.count().await?,
            posts: self.posts.count().await?,
            comments: self.comments.count().await?,
        })
    }
}
