//! SurrealDB implementation of [`CommentRepository`].
//!
//! Creating a comment and appending its reference to the post's
//! comment list happen in one transaction, so the list never points
//! at a comment that does not exist (and vice versa).

use chrono::{DateTime, Utc};
use pluma_core::error::PlumaResult;
use pluma_core::models::comment::{Comment, CommentView, CreateComment};
use pluma_core::repository::CommentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{ProfileRow, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CommentRow {
    content: String,
    author: String,
    post: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CommentRowWithId {
    record_id: String,
    content: String,
    author: String,
    #[allow(dead_code)]
    post: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<Comment, DbError> {
        Ok(Comment {
            id,
            content: self.content,
            author: parse_uuid(&self.author, "comment author")?,
            post: parse_uuid(&self.post, "post")?,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> PlumaResult<Comment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // array::append keeps the post's comment list in insertion
        // order; the first comment stays first.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('comment', $id) SET \
                 content = $content, author = $author, post = $post; \
                 UPDATE type::record('post', $post) SET \
                 comments = array::append(comments, $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("content", input.content))
            .bind(("author", input.author.to_string()))
            .bind(("post", input.post.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        // Statement index 1: slot 0 is the transaction's BEGIN statement.
        let rows: Vec<CommentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn list_for_post(&self, post_id: Uuid) -> PlumaResult<Vec<CommentView>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM comment \
                 WHERE post = $post ORDER BY created_at DESC",
            )
            .bind(("post", post_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRowWithId> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<String> = rows.iter().map(|r| r.author.clone()).collect();
        let mut profile_result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, username, full_name, \
                 profile_pic FROM user WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", author_ids))
            .await
            .map_err(DbError::from)?;
        let profile_rows: Vec<ProfileRow> = profile_result.take(0).map_err(DbError::from)?;
        let profiles = profile_rows
            .into_iter()
            .map(ProfileRow::try_into_profile)
            .collect::<Result<Vec<_>, DbError>>()?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let author_id = parse_uuid(&row.author, "comment author")?;
            if let Some(profile) = profiles.iter().find(|p| p.id == author_id) {
                views.push(CommentView {
                    id: parse_uuid(&row.record_id, "comment")?,
                    content: row.content,
                    author: profile.clone(),
                    created_at: row.created_at,
                });
            }
        }

        Ok(views)
    }

    async fn count(&self) -> PlumaResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM comment GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
