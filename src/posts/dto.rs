use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Post;
use crate::validation::{normalize_text, FieldErrors, Validate};

/// Body for `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    #[serde(alias = "author_id")]
    pub author_id: i64,
}

impl Validate for PostPayload {
    fn normalize(self) -> Self {
        Self {
            title: normalize_text(&self.title),
            content: normalize_text(&self.content),
            author_id: self.author_id,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errs = FieldErrors::default();
        errs.require(!self.title.is_empty(), "title", "Required Title");
        errs.require(!self.content.is_empty(), "content", "Required Content");
        errs.require(self.author_id >= 1, "authorId", "Required Author");
        errs
    }
}

#[derive(Debug, Serialize)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author: PostAuthor,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Post> for PostView {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            author_id: p.author_id,
            author: PostAuthor {
                id: p.author_id,
                username: p.author_username,
                email: p.author_email,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
