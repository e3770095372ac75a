//! Service request API endpoints.

use axum::extract::{Path, State};

use super::{created, required, required_text, success, ApiJson, ApiQuery, ApiResult};
use crate::errors::AppError;
use crate::models::{
    AddCommentRequest, Comment, CreateServiceRequest, DeletedCount, NewComment,
    NewServiceRequest, RequestFilter, RequestStats, ServiceRequest, StatsQuery,
    UpdateStatusRequest,
};
use crate::AppState;

/// GET /api/requests - List requests, optionally filtered.
pub async fn list_requests(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RequestFilter>,
) -> ApiResult<Vec<ServiceRequest>> {
    success(state.repo.list_requests(&filter).await?)
}

/// GET /api/requests/stats - Dashboard counters.
pub async fn request_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<RequestStats> {
    success(state.repo.request_stats(query.client_id.as_deref()).await?)
}

/// GET /api/requests/:id - Get a single request.
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ServiceRequest> {
    match state.repo.get_request(&id).await? {
        Some(request) => success(request),
        None => Err(AppError::NotFound(format!("Request {} not found", id))),
    }
}

/// POST /api/requests - Create a new request.
pub async fn create_request(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateServiceRequest>,
) -> ApiResult<ServiceRequest> {
    // Validate required fields
    let new = NewServiceRequest {
        title: required_text(body.title, "title")?,
        description: required_text(body.description, "description")?,
        request_type: required(body.request_type, "type")?,
        client_id: required_text(body.client_id, "clientId")?,
        client_name: required_text(body.client_name, "clientName")?,
    };

    created(state.repo.create_request(new).await?)
}

/// PUT /api/requests/:id - Overwrite the request status.
pub async fn update_request_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> ApiResult<ServiceRequest> {
    let status = required(body.status, "status")?;
    success(state.repo.update_request_status(&id, status).await?)
}

/// DELETE /api/requests/:id - Delete a request.
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_request(&id).await?;
    success(())
}

/// DELETE /api/requests/client/:client_id - Delete every request of a client.
pub async fn delete_client_requests(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<DeletedCount> {
    let deleted = state.repo.delete_requests_for_client(&client_id).await?;
    success(DeletedCount { deleted })
}

/// POST /api/requests/:id/comments - Add a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AddCommentRequest>,
) -> ApiResult<Comment> {
    let new = NewComment {
        content: required_text(body.content, "content")?,
        user_id: required_text(body.user_id, "userId")?,
        user_name: required_text(body.user_name, "userName")?,
        user_role: required(body.user_role, "userRole")?,
    };

    created(state.repo.add_comment(&id, new).await?)
}
