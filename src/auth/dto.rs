use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::PublicUser;
use super::session::TokenPair;
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for registration. `avatar` and `cover_image` are object
/// keys produced by the upload service, not file payloads.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl RegisterRequest {
    /// Boundary validation: trim everything, lowercase the identity
    /// fields, reject blanks before any store work happens.
    pub fn normalize(mut self) -> Result<Self, ApiError> {
        self.username = self.username.trim().to_lowercase();
        self.email = self.email.trim().to_lowercase();
        self.full_name = self.full_name.trim().to_string();
        self.avatar = self.avatar.trim().to_string();
        self.cover_image = self
            .cover_image
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if self.username.is_empty() || self.email.is_empty() || self.full_name.is_empty() {
            return Err(ApiError::validation("all fields are required"));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("invalid email"));
        }
        if self.password.len() < 8 {
            return Err(ApiError::validation("password must be at least 8 characters"));
        }
        if self.avatar.is_empty() {
            return Err(ApiError::validation("avatar is required"));
        }
        Ok(self)
    }
}

/// Login accepts either the username or the email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

impl LoginRequest {
    pub fn normalize(mut self) -> Result<Self, ApiError> {
        self.identifier = self.identifier.trim().to_lowercase();
        if self.identifier.is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("identifier and password are required"));
        }
        Ok(self)
    }
}

/// Refresh body is optional; the cookie is the usual carrier.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn normalize(self) -> Result<Self, ApiError> {
        if self.old_password.is_empty() {
            return Err(ApiError::validation("old password is required"));
        }
        if self.new_password.len() < 8 {
            return Err(ApiError::validation("password must be at least 8 characters"));
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UpdateAccountRequest {
    pub fn normalize(mut self) -> Result<Self, ApiError> {
        self.email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        self.full_name = self
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        if self.email.is_none() && self.full_name.is_none() {
            return Err(ApiError::validation("nothing to update"));
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(ApiError::validation("invalid email"));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCoverImageRequest {
    pub cover_image: String,
}

/// Response for login and registration-follow-up flows.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.domain.io"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email(""));
    }

    fn register_req() -> RegisterRequest {
        RegisterRequest {
            username: "  NewCreator  ".into(),
            email: "  New.Creator@Example.COM ".into(),
            full_name: " New Creator ".into(),
            password: "long-enough-pw".into(),
            avatar: " avatars/new.jpg ".into(),
            cover_image: Some("   ".into()),
        }
    }

    #[test]
    fn register_normalizes_identity_fields() {
        let req = register_req().normalize().unwrap();
        assert_eq!(req.username, "newcreator");
        assert_eq!(req.email, "new.creator@example.com");
        assert_eq!(req.full_name, "New Creator");
        assert_eq!(req.avatar, "avatars/new.jpg");
        // a blank cover image collapses to "not provided"
        assert!(req.cover_image.is_none());
    }

    #[test]
    fn register_rejects_blank_required_fields() {
        let mut req = register_req();
        req.username = "   ".into();
        assert!(req.normalize().is_err());

        let mut req = register_req();
        req.full_name = String::new();
        assert!(req.normalize().is_err());

        let mut req = register_req();
        req.avatar = "  ".into();
        assert!(req.normalize().is_err());
    }

    #[test]
    fn register_rejects_bad_email_and_short_password() {
        let mut req = register_req();
        req.email = "not-an-email".into();
        assert!(req.normalize().is_err());

        let mut req = register_req();
        req.password = "short".into();
        assert!(req.normalize().is_err());
    }

    #[test]
    fn login_identifier_is_case_normalized() {
        let req = LoginRequest {
            identifier: " NewCreator ".into(),
            password: "whatever".into(),
        };
        assert_eq!(req.normalize().unwrap().identifier, "newcreator");
    }

    #[test]
    fn update_account_requires_some_field() {
        let req = UpdateAccountRequest {
            email: Some("  ".into()),
            full_name: None,
        };
        assert!(req.normalize().is_err());

        let req = UpdateAccountRequest {
            email: Some("User@Example.com".into()),
            full_name: None,
        };
        let req = req.normalize().unwrap();
        assert_eq!(req.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn change_password_enforces_minimum_length() {
        let req = ChangePasswordRequest {
            old_password: "old-password".into(),
            new_password: "short".into(),
        };
        assert!(req.normalize().is_err());
    }
}
