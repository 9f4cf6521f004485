pub mod admin;
pub mod auth;
pub mod catches;
pub mod feedings;
pub mod monitoring;
pub mod pools;
pub mod reports;
pub mod sensors;

use axum::Json;
use serde_json::{json, Value};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::dto::{
    ExportRequest, ExportResponse, LoginRequest, LoginResponse, PoolStatusUpdate,
    ReportExportRequest,
};
use crate::db::{
    models::{
        AuthenticatedUser, CatchInput, ControlCatch, Feeding, FeedingInput, FeedingMethod,
        FeedingRecord, FeedingStatistics, GrowthRecord, MonitoringReading, NewReading, NewUser,
        Pool, PoolInput, PoolStatus, ReadingStatus, Report, ReportKind, ReportSummary, Role,
        Sensor, SensorInput, SensorReading, SensorStatistics, SensorType, User, UserStatus,
    },
    tables::{CellValue, TableData},
};
use crate::{reports::ReportRequest, sessions::Session};

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("UUID")
                    .build(),
            ),
        );
    }
}

// ---------------------------------------------------------------------------
// OpenAPI document (used in api/mod.rs and the generator binary)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::login, auth::logout, auth::me,
        pools::list_pools, pools::create_pool, pools::get_pool, pools::update_pool,
        pools::update_pool_status, pools::delete_pool, pools::list_pool_sensors,
        pools::list_pool_catches, pools::create_pool_catch,
        sensors::list_sensors, sensors::create_sensor, sensors::get_sensor,
        sensors::update_sensor, sensors::delete_sensor, sensors::list_sensor_readings,
        sensors::create_sensor_reading,
        monitoring::latest, monitoring::recent, monitoring::period, monitoring::statistics,
        feedings::list_feedings, feedings::create_feeding, feedings::statistics,
        feedings::period, feedings::update_feeding, feedings::delete_feeding,
        catches::period, catches::delete_catch,
        reports::list_reports, reports::create_report, reports::list_report_types,
        reports::get_report, reports::delete_report, reports::export_reports,
        admin::list_tables, admin::get_table, admin::export_table, admin::export_schema,
        admin::list_users, admin::create_user, admin::list_roles,
    ),
    components(schemas(
        LoginRequest, LoginResponse, Session, AuthenticatedUser, UserStatus,
        Pool, PoolInput, PoolStatus, PoolStatusUpdate,
        Sensor, SensorInput, SensorType, SensorReading, NewReading, ReadingStatus,
        MonitoringReading, SensorStatistics,
        Feeding, FeedingInput, FeedingMethod, FeedingRecord, FeedingStatistics,
        ControlCatch, CatchInput, GrowthRecord,
        Report, ReportKind, ReportSummary, ReportRequest,
        ExportRequest, ReportExportRequest, ExportResponse,
        TableData, CellValue, User, NewUser, Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness check"),
        (name = "auth", description = "Login sessions"),
        (name = "pools", description = "Pools and their control catches"),
        (name = "sensors", description = "Sensors and their readings"),
        (name = "monitoring", description = "Water quality monitoring"),
        (name = "feedings", description = "Feeding journal"),
        (name = "catches", description = "Growth tracking"),
        (name = "reports", description = "Stored reports"),
        (name = "admin", description = "Database browsing, export and accounts"),
    ),
    info(
        title = "FishHub API",
        version = "0.1.0",
        description = "REST API for aquaculture farm records"
    )
)]
pub struct ApiDoc;
