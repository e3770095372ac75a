//! Password store and login endpoints.

use axum::extract::State;

use super::{required_text, success, ApiJson, ApiResult};
use crate::models::{
    ChangePasswordRequest, ForcePasswordRequest, LoginRequest, PasswordStore, User,
};
use crate::AppState;

/// GET /api/users/passwords - Return the whole password store.
pub async fn get_passwords(State(state): State<AppState>) -> ApiResult<PasswordStore> {
    success(state.repo.get_passwords().await?)
}

/// PUT /api/users/passwords - Replace the whole password store.
pub async fn replace_passwords(
    State(state): State<AppState>,
    ApiJson(passwords): ApiJson<PasswordStore>,
) -> ApiResult<()> {
    state.repo.replace_passwords(&passwords).await?;
    success(())
}

/// POST /api/users/change-password and POST /api/update-password.
pub async fn change_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    let user_id = required_text(body.user_id, "userId")?;
    let current_password = required_text(body.current_password, "currentPassword")?;
    let new_password = required_text(body.new_password, "newPassword")?;

    state
        .repo
        .change_password(&user_id, &current_password, &new_password)
        .await?;
    success(())
}

/// POST /api/force-password - Set a password without checking the current one.
pub async fn force_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForcePasswordRequest>,
) -> ApiResult<()> {
    let user_id = required_text(body.user_id, "userId")?;
    let new_password = required_text(body.new_password, "newPassword")?;

    state.repo.force_password(&user_id, &new_password).await?;
    success(())
}

/// POST /api/login - Check an email and password against the stores.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<User> {
    let email = required_text(body.email, "email")?;
    let password = required_text(body.password, "password")?;

    success(state.repo.verify_login(&email, &password).await?)
}
