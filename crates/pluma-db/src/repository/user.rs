//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! Follow and bookmark toggles, and the moderation cascade, run as
//! SurrealDB transactions: reference sets and their denormalized
//! counters are written together, so the counters can never drift
//! from the set cardinality.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use pluma_core::error::PlumaResult;
use pluma_core::models::user::{CreateUser, PublicProfile, UpdateProfile, User, UserSummary};
use pluma_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{ProfileRow, parse_uuid, parse_uuid_list};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    bio: Option<String>,
    dob: DateTime<Utc>,
    gender: Option<String>,
    country: Option<String>,
    category: Option<String>,
    profile_pic: Option<String>,
    social_links: Vec<String>,
    terms_accepted: bool,
    followers: Vec<String>,
    following: Vec<String>,
    bookmarks: Vec<String>,
    follower_count: u64,
    following_count: u64,
    post_count: u64,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    bio: Option<String>,
    dob: DateTime<Utc>,
    gender: Option<String>,
    country: Option<String>,
    category: Option<String>,
    profile_pic: Option<String>,
    social_links: Vec<String>,
    terms_accepted: bool,
    followers: Vec<String>,
    following: Vec<String>,
    bookmarks: Vec<String>,
    follower_count: u64,
    following_count: u64,
    post_count: u64,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            bio: self.bio,
            dob: self.dob,
            gender: self.gender,
            country: self.country,
            category: self.category,
            profile_pic: self.profile_pic,
            social_links: self.social_links,
            terms_accepted: self.terms_accepted,
            followers: parse_uuid_list(self.followers, "follower")?,
            following: parse_uuid_list(self.following, "following")?,
            bookmarks: parse_uuid_list(self.bookmarks, "bookmark")?,
            follower_count: self.follower_count,
            following_count: self.following_count,
            post_count: self.post_count,
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            bio: self.bio,
            dob: self.dob,
            gender: self.gender,
            country: self.country,
            category: self.category,
            profile_pic: self.profile_pic,
            social_links: self.social_links,
            terms_accepted: self.terms_accepted,
            followers: parse_uuid_list(self.followers, "follower")?,
            following: parse_uuid_list(self.following, "following")?,
            bookmarks: parse_uuid_list(self.bookmarks, "bookmark")?,
            follower_count: self.follower_count,
            following_count: self.following_count,
            post_count: self.post_count,
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for search results.
#[derive(Debug, SurrealValue)]
struct SummaryRow {
    record_id: String,
    username: String,
    full_name: String,
    profile_pic: Option<String>,
    bio: Option<String>,
    follower_count: u64,
}

impl SummaryRow {
    fn try_into_summary(self) -> Result<UserSummary, DbError> {
        Ok(UserSummary {
            id: parse_uuid(&self.record_id, "user")?,
            username: self.username,
            full_name: self.full_name,
            profile_pic: self.profile_pic,
            bio: self.bio,
            follower_count: self.follower_count,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Crypto(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> PlumaResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 full_name = $full_name, \
                 bio = $bio, dob = $dob, gender = $gender, \
                 country = $country, category = $category, \
                 profile_pic = $profile_pic, \
                 social_links = [], \
                 terms_accepted = $terms_accepted",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("full_name", input.full_name))
            .bind(("bio", input.bio))
            .bind(("dob", input.dob))
            .bind(("gender", input.gender))
            .bind(("country", input.country))
            .bind(("category", input.category))
            .bind(("profile_pic", input.profile_pic))
            .bind(("terms_accepted", input.terms_accepted))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PlumaResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_username(&self, username: &str) -> PlumaResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_login(&self, email_or_username: &str) -> PlumaResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $login OR username = $login",
            )
            .bind(("login", email_or_username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("login={email_or_username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> PlumaResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE username = $username OR email = $email GROUP ALL",
            )
            .bind(("username", username.to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> PlumaResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.bio.is_some() {
            sets.push("bio = $bio");
        }
        if input.gender.is_some() {
            sets.push("gender = $gender");
        }
        if input.country.is_some() {
            sets.push("country = $country");
        }
        if input.profile_pic.is_some() {
            sets.push("profile_pic = $profile_pic");
        }
        if input.social_links.is_some() {
            sets.push("social_links = $social_links");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(bio) = input.bio {
            // bio is Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("bio", bio));
        }
        if let Some(gender) = input.gender {
            builder = builder.bind(("gender", gender));
        }
        if let Some(country) = input.country {
            builder = builder.bind(("country", country));
        }
        if let Some(profile_pic) = input.profile_pic {
            builder = builder.bind(("profile_pic", profile_pic));
        }
        if let Some(social_links) = input.social_links {
            builder = builder.bind(("social_links", social_links));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> PlumaResult<Vec<PublicProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, username, full_name, \
                 profile_pic FROM user WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let mut profiles = rows
            .into_iter()
            .map(ProfileRow::try_into_profile)
            .collect::<Result<Vec<_>, DbError>>()?;

        // Preserve the caller's id order.
        profiles.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(profiles)
    }

    async fn search(&self, query: Option<&str>, limit: usize) -> PlumaResult<Vec<UserSummary>> {
        let base = "SELECT meta::id(id) AS record_id, username, full_name, \
                    profile_pic, bio, follower_count FROM user";

        let mut result = match query {
            Some(q) => self
                .db
                .query(format!(
                    "{base} WHERE \
                     string::contains(string::lowercase(username), $q) OR \
                     string::contains(string::lowercase(full_name), $q) \
                     ORDER BY created_at DESC LIMIT $limit"
                ))
                .bind(("q", q.to_lowercase()))
                .bind(("limit", limit as u64))
                .await
                .map_err(DbError::from)?,
            None => self
                .db
                .query(format!("{base} ORDER BY created_at DESC LIMIT $limit"))
                .bind(("limit", limit as u64))
                .await
                .map_err(DbError::from)?,
        };

        let rows: Vec<SummaryRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(SummaryRow::try_into_summary)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> PlumaResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 reset_token_hash = $token_hash, \
                 reset_token_expires_at = $expires_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("token_hash", token_hash.to_string()))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> PlumaResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE reset_token_hash = $token_hash \
                 AND reset_token_expires_at != NONE \
                 AND reset_token_expires_at > $now",
            )
            .bind(("token_hash", token_hash.to_string()))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: "reset_token".into(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn reset_password(&self, id: Uuid, new_password: &str) -> PlumaResult<()> {
        let password_hash = hash_password(new_password, self.pepper.as_deref())?;

        // Single write: store the hash and close the reset window, so
        // the token cannot be replayed.
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, \
                 reset_token_hash = NONE, \
                 reset_token_expires_at = NONE, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn toggle_follow(&self, follower: Uuid, target: Uuid) -> PlumaResult<bool> {
        // Both reference sets mutate through set operations and both
        // counters are reassigned from the fresh set cardinality, all
        // inside one transaction.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $follower_rec = type::record('user', $follower); \
                 LET $target_rec = type::record('user', $target); \
                 LET $was = $target IN (SELECT VALUE following FROM ONLY $follower_rec); \
                 IF $was { \
                     UPDATE $follower_rec SET following = array::complement(following, [$target]); \
                     UPDATE $follower_rec SET following_count = array::len(following), updated_at = time::now(); \
                     UPDATE $target_rec SET followers = array::complement(followers, [$follower]); \
                     UPDATE $target_rec SET follower_count = array::len(followers), updated_at = time::now(); \
                 } ELSE { \
                     UPDATE $follower_rec SET following = array::union(following, [$target]); \
                     UPDATE $follower_rec SET following_count = array::len(following), updated_at = time::now(); \
                     UPDATE $target_rec SET followers = array::union(followers, [$follower]); \
                     UPDATE $target_rec SET follower_count = array::len(followers), updated_at = time::now(); \
                 }; \
                 RETURN !$was; \
                 COMMIT TRANSACTION;",
            )
            .bind(("follower", follower.to_string()))
            .bind(("target", target.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        // Index 5: BEGIN(0), three LET(1-3), IF(4), RETURN(5), COMMIT(6).
        let is_following: Option<bool> = result.take(5).map_err(DbError::from)?;
        Ok(is_following
            .ok_or_else(|| DbError::Query("follow toggle returned no result".into()))?)
    }

    async fn is_following(&self, follower: Uuid, target: Uuid) -> PlumaResult<bool> {
        let follower_str = follower.to_string();

        let mut result = self
            .db
            .query("SELECT VALUE following FROM ONLY type::record('user', $follower)")
            .bind(("follower", follower_str.clone()))
            .await
            .map_err(DbError::from)?;

        let following: Option<Vec<String>> = result.take(0).map_err(DbError::from)?;
        let following = following.ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: follower_str,
        })?;

        Ok(following.contains(&target.to_string()))
    }

    async fn toggle_bookmark(&self, user: Uuid, post: Uuid) -> PlumaResult<bool> {
        // The set mutation and the paired counter delta are two
        // dependent writes; the transaction keeps them inseparable.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $user_rec = type::record('user', $user); \
                 LET $post_rec = type::record('post', $post); \
                 LET $was = $post IN (SELECT VALUE bookmarks FROM ONLY $user_rec); \
                 IF $was { \
                     UPDATE $user_rec SET bookmarks = array::complement(bookmarks, [$post]), updated_at = time::now(); \
                     UPDATE $post_rec SET bookmarks_count = math::max([bookmarks_count - 1, 0]); \
                 } ELSE { \
                     UPDATE $user_rec SET bookmarks = array::union(bookmarks, [$post]), updated_at = time::now(); \
                     UPDATE $post_rec SET bookmarks_count = bookmarks_count + 1; \
                 }; \
                 RETURN !$was; \
                 COMMIT TRANSACTION;",
            )
            .bind(("user", user.to_string()))
            .bind(("post", post.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        // Index 5: BEGIN(0), three LET(1-3), IF(4), RETURN(5), COMMIT(6).
        let bookmarked: Option<bool> = result.take(5).map_err(DbError::from)?;
        Ok(bookmarked
            .ok_or_else(|| DbError::Query("bookmark toggle returned no result".into()))?)
    }

    async fn list(&self, pagination: Pagination) -> PlumaResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn delete_cascade(&self, id: Uuid) -> PlumaResult<()> {
        let id_str = id.to_string();

        // One transaction: the user's posts go, comments on those
        // posts and the user's comments anywhere go, and every
        // reference any surviving document held to a deleted id is
        // pulled, with the affected counters recomputed.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $user_rec = type::record('user', $uid); \
                 LET $victim_bookmarks = (SELECT VALUE bookmarks FROM ONLY $user_rec) ?? []; \
                 LET $victim_posts = (SELECT VALUE meta::id(id) FROM post WHERE author = $uid); \
                 LET $victim_comments = (SELECT VALUE meta::id(id) FROM comment WHERE author = $uid OR post IN $victim_posts); \
                 UPDATE post SET comments = array::complement(comments, $victim_comments); \
                 DELETE comment WHERE author = $uid OR post IN $victim_posts; \
                 DELETE post WHERE author = $uid; \
                 UPDATE post SET bookmarks_count = math::max([bookmarks_count - 1, 0]) WHERE meta::id(id) IN $victim_bookmarks; \
                 UPDATE user SET followers = array::complement(followers, [$uid]), \
                     following = array::complement(following, [$uid]), \
                     bookmarks = array::complement(bookmarks, $victim_posts); \
                 UPDATE user SET follower_count = array::len(followers), \
                     following_count = array::len(following); \
                 DELETE $user_rec; \
                 COMMIT TRANSACTION;",
            )
            .bind(("uid", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;

        info!(user_id = %id_str, "Cascading user delete completed");
        Ok(())
    }

    async fn count(&self) -> PlumaResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
