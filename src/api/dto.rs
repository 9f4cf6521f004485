use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::{
    models::{AuthenticatedUser, PoolStatus, ReportKind},
    StoreError,
};

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 1000;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Send as `Authorization: Bearer <token>`.
    pub token: Uuid,
    pub user: AuthenticatedUser,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct PoolStatusUpdate {
    pub status: PoolStatus,
}

/// Optional target file for an export. A bare file name inside the export
/// directory; `.xlsx` is appended when missing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExportRequest {
    pub file_name: Option<String>,
}

impl ExportRequest {
    pub fn target(&self) -> Result<Option<PathBuf>, StoreError> {
        let Some(name) = self.file_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let is_bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
        if !is_bare || name.starts_with('.') {
            return Err(StoreError::validation(
                "file_name must be a plain file name without directories",
            ));
        }
        let mut path = PathBuf::from(name);
        if path.extension().and_then(|e| e.to_str()) != Some("xlsx") {
            path.set_file_name(format!("{name}.xlsx"));
        }
        Ok(Some(path))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportExportRequest {
    pub kind: Option<ReportKind>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    /// Location of the written workbook on the server.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Defaults to 50, capped at 1000.
    pub limit: Option<u32>,
}

impl LimitParams {
    pub fn limit(&self) -> u32 {
        clamp_limit(self.limit)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PoolFilterParams {
    pub pool_id: Option<i64>,
    pub limit: Option<u32>,
}

impl PoolFilterParams {
    pub fn limit(&self) -> u32 {
        clamp_limit(self.limit)
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub pool_id: Option<i64>,
}

/// Inclusive date range with no pool filter.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportListParams {
    pub kind: Option<ReportKind>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsParams {
    /// Reference time for the rolling windows; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
