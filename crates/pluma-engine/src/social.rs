//! Social graph service — follow toggling, feeds, and profiles.

use pluma_core::error::{PlumaError, PlumaResult};
use pluma_core::models::post::Post;
use pluma_core::models::user::{ProfileView, UpdateProfile, User, UserSummary};
use pluma_core::repository::{PostRepository, UserRepository};
use uuid::Uuid;

/// Maximum bio length in characters.
const MAX_BIO_LEN: usize = 500;

/// Feed page size.
const FEED_LIMIT: usize = 20;

/// Recent posts shown on a profile page.
const PROFILE_POSTS_LIMIT: usize = 10;

/// Search result page size.
const SEARCH_LIMIT: usize = 10;

/// A profile page: the public projection plus recent published posts.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profile: ProfileView,
    pub posts: Vec<Post>,
}

/// Social graph service.
pub struct SocialService<U: UserRepository, P: PostRepository> {
    users: U,
    posts: P,
}

impl<U: UserRepository, P: PostRepository> SocialService<U, P> {
    pub fn new(users: U, posts: P) -> Self {
        Self { users, posts }
    }

    /// Toggle the follow edge from `follower_username` to the target.
    ///
    /// Returns the new state: `true` when the follower now follows
    /// the target. Calling this twice always returns to the original
    /// state. After either direction, for both users the reference
    /// sets mirror each other and the counters equal the set sizes.
    pub async fn follow(
        &self,
        follower_username: &str,
        target_user_id: Uuid,
    ) -> PlumaResult<bool> {
        // 1. Resolve both sides; either missing is NotFound.
        let follower = self.users.get_by_username(follower_username).await?;
        let target = self.users.get_by_id(target_user_id).await?;

        // 2. Reject self-follow before touching the graph.
        if follower.id == target.id {
            return Err(PlumaError::validation("Users cannot follow themselves"));
        }

        // 3. The toggle itself is atomic in the repository.
        self.users.toggle_follow(follower.id, target.id).await
    }

    /// Pure read: does the follower currently follow the target?
    pub async fn follow_status(
        &self,
        follower_username: &str,
        target_user_id: Uuid,
    ) -> PlumaResult<bool> {
        let follower = self.users.get_by_username(follower_username).await?;
        self.users.is_following(follower.id, target_user_id).await
    }

    /// Published posts by followed authors, newest first.
    pub async fn feed(&self, username: &str) -> PlumaResult<Vec<Post>> {
        let user = self.users.get_by_username(username).await?;
        self.posts.feed(&user.following, FEED_LIMIT).await
    }

    /// A user's public profile with graph edges expanded and their
    /// recent published posts.
    pub async fn profile(&self, username: &str) -> PlumaResult<ProfilePage> {
        let user = self.users.get_by_username(username).await?;
        let posts = self.posts.list_by_author(user.id, PROFILE_POSTS_LIMIT).await?;
        let profile = self.expand_profile(user).await?;
        Ok(ProfilePage { profile, posts })
    }

    /// Apply profile edits and return the refreshed public view.
    pub async fn update_profile(
        &self,
        username: &str,
        input: UpdateProfile,
    ) -> PlumaResult<ProfileView> {
        if let Some(Some(bio)) = &input.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(PlumaError::validation(format!(
                    "Bio must be at most {MAX_BIO_LEN} characters"
                )));
            }
        }

        let user = self.users.get_by_username(username).await?;
        let updated = self.users.update_profile(user.id, input).await?;
        self.expand_profile(updated).await
    }

    /// Case-insensitive substring search over usernames and full
    /// names; with no query, the most recently joined users.
    pub async fn search_users(&self, query: Option<&str>) -> PlumaResult<Vec<UserSummary>> {
        self.users.search(query, SEARCH_LIMIT).await
    }

    async fn expand_profile(&self, user: User) -> PlumaResult<ProfileView> {
        let followers = self.users.profiles_by_ids(&user.followers).await?;
        let following = self.users.profiles_by_ids(&user.following).await?;
        Ok(ProfileView {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            bio: user.bio,
            country: user.country,
            profile_pic: user.profile_pic,
            social_links: user.social_links,
            followers,
            following,
            follower_count: user.follower_count,
            following_count: user.following_count,
            post_count: user.post_count,
            created_at: user.created_at,
        })
    }
}
