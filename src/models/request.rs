//! Service request and comment models.

use serde::{Deserialize, Serialize};

use super::UserRole;

/// Kind of work a client is asking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Card,
    Post,
    Edit,
    Other,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Card => "card",
            RequestType::Post => "post",
            RequestType::Edit => "edit",
            RequestType::Other => "other",
        }
    }
}

/// Status label of a request. Any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// A comment embedded in its parent request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    pub user_role: UserRole,
    pub created_at: String,
}

/// A client-submitted service request as stored in `requests.json`.
///
/// `client_name` is a snapshot taken at creation time and is not kept in
/// sync with the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub client_id: String,
    pub client_name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Request body for creating a service request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub request_type: Option<RequestType>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
}

/// Validated input for request creation.
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub title: String,
    pub description: String,
    pub request_type: RequestType,
    pub client_id: String,
    pub client_name: String,
}

/// Request body for `PUT /api/requests/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<RequestStatus>,
}

/// Request body for adding a comment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_role: Option<UserRole>,
}

/// Validated input for a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    pub user_role: UserRole,
}

/// Query filters accepted by `GET /api/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default, rename = "type")]
    pub request_type: Option<RequestType>,
    /// Case-insensitive text matched against title and description
    #[serde(default)]
    pub q: Option<String>,
}

impl RequestFilter {
    pub fn matches(&self, request: &ServiceRequest) -> bool {
        if let Some(client_id) = &self.client_id {
            if &request.client_id != client_id {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if self.request_type.is_some_and(|t| t != request.request_type) {
            return false;
        }
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let needle = q.to_lowercase();
                request.title.to_lowercase().contains(&needle)
                    || request.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Query for `GET /api/requests/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedCount {
    pub deleted: usize,
}
