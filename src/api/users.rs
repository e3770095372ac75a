//! User directory API endpoints.

use axum::extract::{Path, State};

use super::{created, required, required_text, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges};
use crate::AppState;

/// GET /api/users - List all users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    success(state.repo.list_users().await?)
}

/// GET /api/users/:id - Get a single user.
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    match state.repo.get_user(&id).await? {
        Some(user) => success(user),
        None => Err(AppError::NotFound(format!("User {} not found", id))),
    }
}

/// POST /api/users - Create a user and, if given, its initial password.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    let new = NewUser {
        name: required_text(body.name, "name")?,
        email: required_text(body.email, "email")?,
        role: required(body.role, "role")?,
        password: body.password,
    };

    created(state.repo.create_user(new).await?)
}

/// PUT /api/users/:id - Update name, email and optionally role.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let changes = UserChanges {
        name: required_text(body.name, "name")?,
        email: required_text(body.email, "email")?,
        role: body.role,
    };

    success(state.repo.update_user(&id, changes).await?)
}

/// DELETE /api/users/:id - Delete a user and its password entry.
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_user(&id).await?;
    success(())
}
