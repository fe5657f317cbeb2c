use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::visit::{GeoLocation, VisitRecord};

#[derive(Deserialize, Debug, Default)]
pub struct RecordVisitRequest {
    pub page: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisitQueryParams {
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub path: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct DeleteVisitsRequest {
    #[validate(length(min = 1, message = "ids must not be empty"))]
    pub ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse {
    pub id: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub page: String,
    #[serde(skip_serializing_if = "GeoLocation::is_empty")]
    pub location: GeoLocation,
    pub created_at: DateTime<Utc>,
}

impl From<VisitRecord> for VisitResponse {
    fn from(visit: VisitRecord) -> Self {
        Self {
            id: visit.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            ip: visit.ip,
            user_agent: visit.user_agent,
            page: visit.page,
            location: visit.location,
            created_at: visit.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitListMeta {
    pub total: u64,
    pub page: u64,
    pub limit: i64,
    pub total_pages: u64,
}

#[derive(Serialize)]
pub struct VisitListResponse {
    pub visits: Vec<VisitResponse>,
    pub meta: VisitListMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStatsResponse {
    pub total_visits: u64,
    pub unique_visitors_today: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountResponse {
    pub deleted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfigResponse {
    pub last_log_cleanup: Option<String>,
}

impl DeleteVisitsRequest {
    /// Parse the raw id strings into ObjectIds, reporting the first
    /// malformed one.
    pub fn object_ids(&self) -> Result<Vec<ObjectId>, String> {
        self.ids
            .iter()
            .map(|id| {
                ObjectId::parse_str(id).map_err(|_| format!("Invalid visit id: {}", id))
            })
            .collect()
    }
}
