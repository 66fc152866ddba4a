use serde::{Deserialize, Serialize};

use crate::{
    users::dto::PublicUser,
    validation::{is_valid_email, normalize_email, FieldErrors, Validate},
};

/// Request body for login.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn normalize(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errs = FieldErrors::default();
        errs.require(!self.password.is_empty(), "password", "Required Password.");
        if self.email.is_empty() {
            errs.push("email", "Required Email.");
        } else if !is_valid_email(&self.email) {
            errs.push("email", "Invalid Email.");
        }
        errs
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}
