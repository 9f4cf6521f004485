use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Enumerations (stored as snake_case TEXT)
// ---------------------------------------------------------------------------

/// Login state of an account. Flipped to `Active` on login and back to
/// `Disconnected` on logout or shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Active,
    Maintenance,
}

/// Physical parameter measured by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Oxygen,
    Ph,
    Salinity,
    Turbidity,
    Ammonia,
}

impl SensorType {
    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Oxygen | SensorType::Ammonia => "mg/L",
            SensorType::Ph => "",
            SensorType::Salinity => "‰",
            SensorType::Turbidity => "NTU",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorType::Temperature => "temperature",
            SensorType::Oxygen => "oxygen",
            SensorType::Ph => "ph",
            SensorType::Salinity => "salinity",
            SensorType::Turbidity => "turbidity",
            SensorType::Ammonia => "ammonia",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadingStatus::Normal => "normal",
            ReadingStatus::Warning => "warning",
            ReadingStatus::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedingMethod {
    Automatic,
    Manual,
}

/// Kind of stored report. Selects which data is collected into the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    DailyMonitoring,
    FeedingAnalysis,
    GrowthStatistics,
    Technological,
    EquipmentStatus,
}

impl ReportKind {
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::DailyMonitoring => "Daily monitoring report",
            ReportKind::FeedingAnalysis => "Feeding analysis report",
            ReportKind::GrowthStatistics => "Fish growth statistics",
            ReportKind::Technological => "Technological report",
            ReportKind::EquipmentStatus => "Equipment status report",
        }
    }
}

// ---------------------------------------------------------------------------
// Users and roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
}

/// Account row without the password hash.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub role_id: i64,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful credential check, joined with the role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub role_id: i64,
    pub role_name: String,
    pub is_admin: bool,
    pub status: UserStatus,
}

impl AuthenticatedUser {
    pub fn full_name(&self) -> String {
        full_name(&self.last_name, &self.first_name, self.patronymic.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub role_id: i64,
}

impl NewUser {
    pub fn validate(&self) -> StoreResult<()> {
        check_len("username", &self.username, 3, 50)?;
        if self.password.chars().count() < 4 {
            return Err(StoreError::validation("password must be at least 4 characters"));
        }
        check_len("first_name", &self.first_name, 1, 50)?;
        check_len("last_name", &self.last_name, 1, 50)?;
        if let Some(p) = &self.patronymic {
            check_len("patronymic", p, 0, 50)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Pool {
    pub id: i64,
    pub name: String,
    /// Cubic metres
    pub volume: f64,
    pub species: String,
    pub fish_count: i64,
    pub stocked_on: NaiveDate,
    pub status: PoolStatus,
}

/// Writable pool fields, used for both insert and full-row update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PoolInput {
    pub name: String,
    pub volume: f64,
    pub species: String,
    pub fish_count: i64,
    pub stocked_on: NaiveDate,
    pub status: PoolStatus,
}

impl PoolInput {
    pub fn validate(&self) -> StoreResult<()> {
        check_len("name", &self.name, 1, 100)?;
        check_len("species", &self.species, 1, 50)?;
        if !(self.volume.is_finite() && self.volume > 0.0) {
            return Err(StoreError::validation("volume must be a positive number"));
        }
        if self.fish_count < 0 {
            return Err(StoreError::validation("fish_count must not be negative"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensors and readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Sensor {
    pub id: i64,
    pub pool_id: i64,
    pub sensor_type: SensorType,
    pub model: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub installed_on: NaiveDate,
}

impl Sensor {
    /// Derive a status from the declared measurement range.
    ///
    /// Inside `[min, max]` is normal, outside by at most 10% of the span is a
    /// warning, anything further is critical. An open bound never triggers.
    pub fn classify(&self, value: f64) -> ReadingStatus {
        let span = match (self.range_min, self.range_max) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0.0,
        };
        let tolerance = span.abs() * 0.1;

        let deviation = match (self.range_min, self.range_max) {
            (Some(lo), _) if value < lo => lo - value,
            (_, Some(hi)) if value > hi => value - hi,
            _ => return ReadingStatus::Normal,
        };

        if deviation <= tolerance {
            ReadingStatus::Warning
        } else {
            ReadingStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SensorInput {
    pub pool_id: i64,
    pub sensor_type: SensorType,
    pub model: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub installed_on: NaiveDate,
}

impl SensorInput {
    pub fn validate(&self) -> StoreResult<()> {
        check_len("model", &self.model, 1, 100)?;
        if let (Some(lo), Some(hi)) = (self.range_min, self.range_max) {
            if lo > hi {
                return Err(StoreError::validation(
                    "range_min must not be greater than range_max",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: i64,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub status: ReadingStatus,
}

/// A reading to record. Without `status` the sensor's range decides it;
/// without `recorded_at` the current time is used.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewReading {
    pub value: f64,
    pub status: Option<ReadingStatus>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewReading {
    pub const MIN_VALUE: f64 = -100.0;
    pub const MAX_VALUE: f64 = 1000.0;

    pub fn validate(&self) -> StoreResult<()> {
        if !(self.value.is_finite() && (Self::MIN_VALUE..=Self::MAX_VALUE).contains(&self.value)) {
            return Err(StoreError::validation(format!(
                "value must be between {} and {}",
                Self::MIN_VALUE,
                Self::MAX_VALUE
            )));
        }
        Ok(())
    }
}

/// Reading joined with its sensor and pool, as shown on the monitoring tab.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct MonitoringReading {
    pub id: i64,
    pub sensor_id: i64,
    pub pool_id: i64,
    pub pool_name: String,
    pub sensor_type: SensorType,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub status: ReadingStatus,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SensorStatistics {
    pub sensor_type: SensorType,
    pub readings: i64,
    pub min_value: f64,
    pub max_value: f64,
    pub avg_value: f64,
    pub warnings: i64,
    pub criticals: i64,
}

// ---------------------------------------------------------------------------
// Feedings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Feeding {
    pub id: i64,
    pub pool_id: i64,
    pub feed_type: String,
    pub amount_kg: f64,
    pub fed_at: DateTime<Utc>,
    pub method: FeedingMethod,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeedingInput {
    pub pool_id: i64,
    pub feed_type: String,
    pub amount_kg: f64,
    /// Defaults to now.
    pub fed_at: Option<DateTime<Utc>>,
    pub method: FeedingMethod,
}

impl FeedingInput {
    pub const MAX_AMOUNT_KG: f64 = 100.0;

    pub fn validate(&self) -> StoreResult<()> {
        check_len("feed_type", &self.feed_type, 1, 50)?;
        if !(self.amount_kg.is_finite()
            && self.amount_kg > 0.0
            && self.amount_kg <= Self::MAX_AMOUNT_KG)
        {
            return Err(StoreError::validation(format!(
                "amount_kg must be greater than 0 and at most {}",
                Self::MAX_AMOUNT_KG
            )));
        }
        Ok(())
    }
}

/// Feeding joined with the pool name, newest first in history listings.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct FeedingRecord {
    pub id: i64,
    pub pool_id: i64,
    pub pool_name: String,
    pub feed_type: String,
    pub amount_kg: f64,
    pub fed_at: DateTime<Utc>,
    pub method: FeedingMethod,
}

/// Total kilograms fed in rolling windows ending at the reference time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct FeedingStatistics {
    pub today: f64,
    pub week: f64,
    pub month: f64,
}

// ---------------------------------------------------------------------------
// Control catches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ControlCatch {
    pub id: i64,
    pub pool_id: i64,
    /// Grams
    pub average_weight_g: f64,
    pub fish_count: i64,
    pub caught_on: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CatchInput {
    pub average_weight_g: f64,
    pub fish_count: i64,
    pub caught_on: NaiveDate,
    pub note: Option<String>,
}

impl CatchInput {
    pub fn validate(&self) -> StoreResult<()> {
        if !(self.average_weight_g.is_finite() && self.average_weight_g > 0.0) {
            return Err(StoreError::validation("average_weight_g must be positive"));
        }
        if self.fish_count < 0 {
            return Err(StoreError::validation("fish_count must not be negative"));
        }
        Ok(())
    }
}

/// Control catch joined with its pool, used for growth reporting.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GrowthRecord {
    pub id: i64,
    pub pool_id: i64,
    pub pool_name: String,
    pub species: String,
    pub average_weight_g: f64,
    pub fish_count: i64,
    pub caught_on: NaiveDate,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: i64,
    pub pool_id: i64,
    pub author_id: i64,
    pub report_type: ReportKind,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub formed_at: DateTime<Utc>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub pool_id: i64,
    pub author_id: i64,
    pub kind: ReportKind,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub formed_at: DateTime<Utc>,
    pub body: String,
}

/// Report row joined with pool and author names for the report list.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub id: i64,
    pub report_type: ReportKind,
    pub pool_id: i64,
    pub pool_name: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    pub formed_at: DateTime<Utc>,
    pub body: String,
}

impl ReportSummary {
    pub fn author_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.author_last_name.as_deref().unwrap_or_default(),
            self.author_first_name.as_deref().unwrap_or_default()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_owned())
    }

    pub fn is_filled(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn full_name(last: &str, first: &str, patronymic: Option<&str>) -> String {
    [Some(last), Some(first), patronymic]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> StoreResult<()> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(StoreError::validation(format!("{field} is required")));
    }
    if len > max {
        return Err(StoreError::validation(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(())
}
