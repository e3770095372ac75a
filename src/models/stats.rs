//! Dashboard counters over service requests.

use serde::Serialize;

use super::{RequestStatus, RequestType, ServiceRequest};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TypeCounts {
    pub card: usize,
    pub post: usize,
    pub edit: usize,
    pub other: usize,
}

/// Request counts per status and per type.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_type: TypeCounts,
}

impl RequestStats {
    pub fn tally<'a>(requests: impl IntoIterator<Item = &'a ServiceRequest>) -> Self {
        let mut stats = Self::default();
        for request in requests {
            stats.total += 1;
            match request.status {
                RequestStatus::Pending => stats.by_status.pending += 1,
                RequestStatus::InProgress => stats.by_status.in_progress += 1,
                RequestStatus::Completed => stats.by_status.completed += 1,
                RequestStatus::Rejected => stats.by_status.rejected += 1,
            }
            match request.request_type {
                RequestType::Card => stats.by_type.card += 1,
                RequestType::Post => stats.by_type.post += 1,
                RequestType::Edit => stats.by_type.edit += 1,
                RequestType::Other => stats.by_type.other += 1,
            }
        }
        stats
    }
}
