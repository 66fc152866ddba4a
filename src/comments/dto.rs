use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Comment;
use crate::validation::{normalize_text, FieldErrors, Validate};

/// Body for `POST /comments`. The commenting user comes from the token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewComment {
    pub body: String,
    #[serde(alias = "post_id")]
    pub post_id: i64,
}

impl Validate for NewComment {
    fn normalize(self) -> Self {
        Self {
            body: normalize_text(&self.body),
            post_id: self.post_id,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errs = FieldErrors::default();
        errs.require(!self.body.is_empty(), "body", "Required Body");
        errs.require(self.post_id >= 1, "postId", "Required PostID");
        errs
    }
}

/// Body for `PUT /comments/{id}`. Owner and post are kept from the stored row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentEdit {
    pub body: String,
}

impl Validate for CommentEdit {
    fn normalize(self) -> Self {
        Self {
            body: normalize_text(&self.body),
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errs = FieldErrors::default();
        errs.require(!self.body.is_empty(), "body", "Required Body");
        errs
    }
}

#[derive(Debug, Serialize)]
pub struct CommentAuthor {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub body: String,
    pub user: CommentAuthor,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            post_id: c.post_id,
            body: c.body,
            user: CommentAuthor {
                id: c.user_id,
                username: c.username,
            },
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
