//! SurrealDB implementation of [`PostRepository`].
//!
//! `slug` and `reading_time` are derived here, never accepted from a
//! caller. The like toggle is a single conditional UPDATE, so the
//! membership test and the mutation cannot interleave with another
//! writer; the delete cascade runs in one transaction.

use chrono::{DateTime, Utc};
use pluma_core::error::PlumaResult;
use pluma_core::models::comment::CommentView;
use pluma_core::models::post::{
    Category, CreatePost, Post, PostFilter, PostSort, PostView, UpdatePost,
};
use pluma_core::models::user::PublicProfile;
use pluma_core::repository::PostRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{ProfileRow, parse_uuid, parse_uuid_list};

/// Words per minute assumed when deriving `reading_time`.
const READING_WPM: usize = 200;

/// Length of the random slug suffix.
const SLUG_SUFFIX_LEN: usize = 6;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PostRow {
    title: String,
    slug: String,
    content: String,
    category: String,
    tags: Vec<String>,
    image: Option<String>,
    author: String,
    is_published: bool,
    likes: Vec<String>,
    comments: Vec<String>,
    view_count: u64,
    share_count: u64,
    bookmarks_count: u64,
    reading_time: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct for list queries: includes the record ID via
/// `meta::id(id)` and the `array::len(likes)` alias the trending and
/// popular sorts order by.
#[derive(Debug, SurrealValue)]
struct PostListRow {
    record_id: String,
    #[allow(dead_code)]
    like_count: u64,
    title: String,
    slug: String,
    content: String,
    category: String,
    tags: Vec<String>,
    image: Option<String>,
    author: String,
    is_published: bool,
    likes: Vec<String>,
    comments: Vec<String>,
    view_count: u64,
    share_count: u64,
    bookmarks_count: u64,
    reading_time: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_category(s: &str) -> Result<Category, DbError> {
    Category::parse(s).ok_or_else(|| DbError::Query(format!("unknown post category: {s}")))
}

impl PostRow {
    fn into_post(self, id: Uuid) -> Result<Post, DbError> {
        Ok(Post {
            id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            category: parse_category(&self.category)?,
            tags: self.tags,
            image: self.image,
            author: parse_uuid(&self.author, "author")?,
            is_published: self.is_published,
            likes: parse_uuid_list(self.likes, "like")?,
            comments: parse_uuid_list(self.comments, "comment")?,
            view_count: self.view_count,
            share_count: self.share_count,
            bookmarks_count: self.bookmarks_count,
            reading_time: self.reading_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PostListRow {
    fn try_into_post(self) -> Result<Post, DbError> {
        let id = parse_uuid(&self.record_id, "post")?;
        Ok(Post {
            id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            category: parse_category(&self.category)?,
            tags: self.tags,
            image: self.image,
            author: parse_uuid(&self.author, "author")?,
            is_published: self.is_published,
            likes: parse_uuid_list(self.likes, "like")?,
            comments: parse_uuid_list(self.comments, "comment")?,
            view_count: self.view_count,
            share_count: self.share_count,
            bookmarks_count: self.bookmarks_count,
            reading_time: self.reading_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for comment expansion inside a post view.
#[derive(Debug, SurrealValue)]
struct CommentRow {
    record_id: String,
    content: String,
    author: String,
    created_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Reduce a title to its URL-safe form: lowercased, non-alphanumerics
/// stripped, whitespace runs collapsed to single hyphens.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if c.is_whitespace() && !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Random lowercase-alphanumeric suffix keeping slugs unique across
/// posts with identical titles.
fn slug_suffix() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..SLUG_SUFFIX_LEN)
        .map(|_| {
            let idx = rand::Rng::random_range(&mut rng, 0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}

fn derive_slug(title: &str) -> String {
    let base = slugify(title);
    if base.is_empty() {
        slug_suffix()
    } else {
        format!("{base}-{}", slug_suffix())
    }
}

/// Estimated minutes to read at ~200 wpm, never less than 1.
fn reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    (words.div_ceil(READING_WPM)).max(1) as u32
}

const LIST_SELECT: &str =
    "SELECT meta::id(id) AS record_id, array::len(likes) AS like_count, * FROM post";

/// SurrealDB implementation of the Post repository.
#[derive(Clone)]
pub struct SurrealPostRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPostRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn take_posts(&self, mut result: surrealdb::IndexedResults) -> Result<Vec<Post>, DbError> {
        let rows: Vec<PostListRow> = result.take(0)?;
        rows.into_iter().map(PostListRow::try_into_post).collect()
    }

    async fn profiles_for(&self, ids: &[Uuid]) -> Result<Vec<PublicProfile>, DbError> {
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
            .await?;
        let rows: Vec<ProfileRow> = result.take(0)?;
        rows.into_iter().map(ProfileRow::try_into_profile).collect()
    }
}

impl<C: Connection> PostRepository for SurrealPostRepository<C> {
    async fn create(&self, input: CreatePost) -> PlumaResult<Post> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let slug = derive_slug(&input.title);
        let minutes = reading_time(&input.content);

        // The author's post_count moves in the same transaction as
        // the insert.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('post', $id) SET \
                 title = $title, slug = $slug, content = $content, \
                 category = $category, tags = $tags, image = $image, \
                 author = $author, reading_time = $reading_time; \
                 UPDATE type::record('user', $author) SET \
                 post_count = post_count + 1; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("slug", slug))
            .bind(("content", input.content))
            .bind(("category", input.category.as_str()))
            .bind(("tags", input.tags))
            .bind(("image", input.image))
            .bind(("author", input.author.to_string()))
            .bind(("reading_time", minutes))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        // Statement index 1: slot 0 is the transaction's BEGIN statement.
        let rows: Vec<PostRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PlumaResult<Post> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('post', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn get_view(&self, id: Uuid) -> PlumaResult<PostView> {
        let post = self.get_by_id(id).await?;

        let author = self
            .profiles_for(&[post.author])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "user".into(),
                id: post.author.to_string(),
            })?;

        let likes = self.profiles_for(&post.likes).await?;

        // Comments come back keyed by id; the post's reference list is
        // the authority on ordering.
        let mut comments = Vec::with_capacity(post.comments.len());
        if !post.comments.is_empty() {
            let id_strs: Vec<String> = post.comments.iter().map(Uuid::to_string).collect();
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, content, author, \
                     created_at FROM comment WHERE meta::id(id) IN $ids",
                )
                .bind(("ids", id_strs))
                .await
                .map_err(DbError::from)?;
            let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;

            let author_ids = rows
                .iter()
                .map(|r| parse_uuid(&r.author, "comment author"))
                .collect::<Result<Vec<_>, DbError>>()?;
            let authors = self.profiles_for(&author_ids).await?;

            let mut by_id = std::collections::HashMap::new();
            for row in rows {
                let comment_id = parse_uuid(&row.record_id, "comment")?;
                let author_id = parse_uuid(&row.author, "comment author")?;
                if let Some(profile) = authors.iter().find(|p| p.id == author_id) {
                    by_id.insert(
                        comment_id,
                        CommentView {
                            id: comment_id,
                            content: row.content,
                            author: profile.clone(),
                            created_at: row.created_at,
                        },
                    );
                }
            }
            for comment_id in &post.comments {
                if let Some(view) = by_id.remove(comment_id) {
                    comments.push(view);
                }
            }
        }

        Ok(PostView {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            category: post.category,
            tags: post.tags,
            image: post.image,
            author,
            is_published: post.is_published,
            likes,
            comments,
            view_count: post.view_count,
            share_count: post.share_count,
            bookmarks_count: post.bookmarks_count,
            reading_time: post.reading_time,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }

    async fn update(&self, id: Uuid, input: UpdatePost) -> PlumaResult<Post> {
        let current = self.get_by_id(id).await?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        let mut new_slug = None;
        if let Some(title) = &input.title {
            sets.push("title = $title");
            if *title != current.title {
                new_slug = Some(derive_slug(title));
                sets.push("slug = $slug");
            }
        }
        let mut new_reading_time = None;
        if let Some(content) = &input.content {
            sets.push("content = $content");
            new_reading_time = Some(reading_time(content));
            sets.push("reading_time = $reading_time");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        if input.image.is_some() {
            sets.push("image = $image");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('post', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(slug) = new_slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(content) = input.content {
            builder = builder.bind(("content", content));
        }
        if let Some(minutes) = new_reading_time {
            builder = builder.bind(("reading_time", minutes));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category.as_str()));
        }
        if let Some(tags) = input.tags {
            builder = builder.bind(("tags", tags));
        }
        if let Some(image) = input.image {
            // image is Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("image", image));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn delete_cascade(&self, id: Uuid) -> PlumaResult<()> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $post_rec = type::record('post', $pid); \
                 LET $post_author = (SELECT VALUE author FROM ONLY $post_rec); \
                 DELETE comment WHERE post = $pid; \
                 UPDATE user SET bookmarks = array::complement(bookmarks, [$pid]); \
                 IF $post_author != NONE { \
                     UPDATE type::record('user', $post_author) SET \
                     post_count = math::max([post_count - 1, 0]); \
                 }; \
                 DELETE $post_rec; \
                 COMMIT TRANSACTION;",
            )
            .bind(("pid", id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, filter: &PostFilter, limit: usize) -> PlumaResult<Vec<Post>> {
        let mut conds: Vec<&str> = Vec::new();
        if !filter.include_unpublished {
            conds.push("is_published = true");
        }
        if filter.category.is_some() {
            conds.push("category = $category");
        }
        if filter.q.is_some() {
            conds.push(
                "(string::contains(string::lowercase(title), $q) OR \
                 string::contains(string::lowercase(content), $q) OR \
                 string::contains(string::lowercase(array::join(tags, ' ')), $q))",
            );
        }
        if filter.tag.is_some() {
            conds.push("$tag IN array::map(tags, |$t| string::lowercase($t))");
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };
        let order = match filter.sort {
            PostSort::Newest => "created_at DESC",
            PostSort::Trending => "view_count DESC, like_count DESC, created_at DESC",
            PostSort::Popular => "share_count DESC, like_count DESC",
        };
        let query = format!("{LIST_SELECT}{where_clause} ORDER BY {order} LIMIT $limit");

        let mut builder = self.db.query(&query).bind(("limit", limit as u64));
        if let Some(category) = filter.category {
            builder = builder.bind(("category", category.as_str()));
        }
        if let Some(q) = &filter.q {
            builder = builder.bind(("q", q.to_lowercase()));
        }
        if let Some(tag) = &filter.tag {
            builder = builder.bind(("tag", tag.to_lowercase()));
        }

        let result = builder.await.map_err(DbError::from)?;
        Ok(self.take_posts(result)?)
    }

    async fn list_by_author(&self, author: Uuid, limit: usize) -> PlumaResult<Vec<Post>> {
        let result = self
            .db
            .query(format!(
                "{LIST_SELECT} WHERE author = $author AND is_published = true \
                 ORDER BY created_at DESC LIMIT $limit"
            ))
            .bind(("author", author.to_string()))
            .bind(("limit", limit as u64))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_posts(result)?)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> PlumaResult<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let result = self
            .db
            .query(format!("{LIST_SELECT} WHERE meta::id(id) IN $ids"))
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let mut posts = self.take_posts(result)?;
        // Preserve the caller's id order (bookmark order).
        posts.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(posts)
    }

    async fn feed(&self, authors: &[Uuid], limit: usize) -> PlumaResult<Vec<Post>> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let author_strs: Vec<String> = authors.iter().map(Uuid::to_string).collect();
        let result = self
            .db
            .query(format!(
                "{LIST_SELECT} WHERE author IN $authors AND is_published = true \
                 ORDER BY created_at DESC LIMIT $limit"
            ))
            .bind(("authors", author_strs))
            .bind(("limit", limit as u64))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_posts(result)?)
    }

    async fn recommendations(&self, post_id: Uuid, limit: usize) -> PlumaResult<Vec<Post>> {
        let source = self.get_by_id(post_id).await?;

        let result = self
            .db
            .query(format!(
                "{LIST_SELECT} WHERE category = $category AND \
                 is_published = true AND meta::id(id) != $id \
                 ORDER BY created_at DESC LIMIT $limit"
            ))
            .bind(("category", source.category.as_str()))
            .bind(("id", post_id.to_string()))
            .bind(("limit", limit as u64))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_posts(result)?)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> PlumaResult<Post> {
        let id_str = post_id.to_string();

        // One conditional UPDATE: membership test and mutation cannot
        // interleave with another writer.
        let result = self
            .db
            .query(
                "UPDATE type::record('post', $id) SET \
                 likes = IF $user IN likes THEN \
                 array::complement(likes, [$user]) ELSE \
                 array::union(likes, [$user]) END",
            )
            .bind(("id", id_str.clone()))
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(post_id)?)
    }

    async fn increment_view(&self, id_or_slug: &str) -> PlumaResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE post SET view_count = view_count + 1 \
                 WHERE meta::id(id) = $key OR slug = $key",
            )
            .bind(("key", id_or_slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_or_slug.to_string(),
        })?;

        Ok(row.view_count)
    }

    async fn increment_share(&self, id_or_slug: &str) -> PlumaResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE post SET share_count = share_count + 1 \
                 WHERE meta::id(id) = $key OR slug = $key",
            )
            .bind(("key", id_or_slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_or_slug.to_string(),
        })?;

        Ok(row.share_count)
    }

    async fn toggle_publish(&self, id: Uuid) -> PlumaResult<Post> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('post', $id) SET \
                 is_published = !is_published, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn count(&self) -> PlumaResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM post GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
