//! SurrealDB repository implementations.

mod comment;
mod post;
mod user;

pub use comment::SurrealCommentRepository;
pub use post::SurrealPostRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use pluma_core::models::user::PublicProfile;

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_uuid_list(values: Vec<String>, what: &str) -> Result<Vec<Uuid>, DbError> {
    values.iter().map(|v| parse_uuid(v, what)).collect()
}

/// Row struct for the minimal public identity projection.
#[derive(Debug, SurrealValue)]
pub(crate) struct ProfileRow {
    pub record_id: String,
    pub username: String,
    pub full_name: String,
    pub profile_pic: Option<String>,
}

impl ProfileRow {
    pub fn try_into_profile(self) -> Result<PublicProfile, DbError> {
        Ok(PublicProfile {
            id: parse_uuid(&self.record_id, "user")?,
            username: self.username,
            full_name: self.full_name,
            profile_pic: self.profile_pic,
        })
    }
}
