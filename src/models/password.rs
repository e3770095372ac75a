//! Password store and credential request bodies.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Contents of `passwords.json`: user id to plaintext password.
pub type PasswordStore = BTreeMap<String, String>;

/// Body of the checked password change endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Body of `POST /api/force-password`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcePasswordRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
