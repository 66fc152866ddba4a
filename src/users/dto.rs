use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::User;
use crate::validation::{is_valid_email, normalize_email, normalize_text, FieldErrors, Validate};

/// Body for `POST /users` and `PUT /users/{id}` (full replacement).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for UserPayload {
    fn normalize(self) -> Self {
        Self {
            username: normalize_text(&self.username),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errs = FieldErrors::default();
        errs.require(!self.username.is_empty(), "username", "Required username.");
        errs.require(!self.password.is_empty(), "password", "Required Password.");
        if self.email.is_empty() {
            errs.push("email", "Required Email.");
        } else if !is_valid_email(&self.email) {
            errs.push("email", "Invalid Email.");
        }
        errs
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
