//! User directory models.

use serde::{Deserialize, Serialize};

/// Role of a user; also recorded on every comment they write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
        }
    }
}

/// A user as stored in `users.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl User {
    /// Case-insensitive email comparison used for uniqueness checks and login.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}

/// Request body for creating a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Initial password, written to the password store after the user record
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for updating an existing user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Validated input for user creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub password: Option<String>,
}

/// Validated input for a user update.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Option<UserRole>,
}
