use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::{dto::LimitParams, errors::AppError, extract::CurrentUser, AppState};
use crate::{
    db::models::{MonitoringReading, NewReading, Sensor, SensorInput, SensorReading},
    monitoring,
};

#[utoipa::path(
    get,
    path = "/sensors",
    responses((status = 200, description = "All sensors", body = Vec<Sensor>)),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn list_sensors(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Sensor>>, AppError> {
    Ok(Json(state.store.get_all_sensors().await?))
}

#[utoipa::path(
    post,
    path = "/sensors",
    request_body = SensorInput,
    responses(
        (status = 201, description = "Sensor installed", body = Sensor),
        (status = 409, description = "Unknown pool"),
        (status = 422, description = "Invalid sensor attributes"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn create_sensor(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<SensorInput>,
) -> Result<(StatusCode, Json<Sensor>), AppError> {
    let sensor = state.store.add_sensor(&input).await?;
    Ok((StatusCode::CREATED, Json(sensor)))
}

#[utoipa::path(
    get,
    path = "/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "The sensor", body = Sensor),
        (status = 404, description = "No such sensor"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn get_sensor(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Sensor>, AppError> {
    Ok(Json(state.store.get_sensor_by_id(id).await?))
}

#[utoipa::path(
    put,
    path = "/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    request_body = SensorInput,
    responses(
        (status = 200, description = "Updated sensor", body = Sensor),
        (status = 404, description = "No such sensor"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn update_sensor(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<SensorInput>,
) -> Result<Json<Sensor>, AppError> {
    let sensor = state.store.update_sensor(id, &input).await?;
    monitoring::rejoin_sensor(&state.store, &state.cache, id).await?;
    Ok(Json(sensor))
}

#[utoipa::path(
    delete,
    path = "/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 204, description = "Sensor removed"),
        (status = 404, description = "No such sensor"),
        (status = 409, description = "Readings still reference the sensor"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn delete_sensor(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_sensor(id).await?;
    state.cache.remove(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Most recent readings of one sensor, newest first.
#[utoipa::path(
    get,
    path = "/sensors/{id}/readings",
    params(("id" = i64, Path, description = "Sensor id"), LimitParams),
    responses((status = 200, description = "Readings", body = Vec<SensorReading>)),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn list_sensor_readings(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<SensorReading>>, AppError> {
    Ok(Json(state.store.get_sensor_readings(id, params.limit()).await?))
}

/// Record a reading. Without `status` it is derived from the sensor's range.
#[utoipa::path(
    post,
    path = "/sensors/{id}/readings",
    params(("id" = i64, Path, description = "Sensor id")),
    request_body = NewReading,
    responses(
        (status = 201, description = "Reading stored", body = MonitoringReading),
        (status = 404, description = "No such sensor"),
        (status = 422, description = "Value out of accepted range"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn create_sensor_reading(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(reading): Json<NewReading>,
) -> Result<(StatusCode, Json<MonitoringReading>), AppError> {
    let stored = monitoring::record_reading(&state.store, &state.cache, id, &reading).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
