use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::{dto::PoolStatusUpdate, errors::AppError, extract::CurrentUser, AppState};
use crate::{
    db::models::{CatchInput, ControlCatch, Pool, PoolInput, Sensor},
    monitoring,
};

/// List every pool, ordered by name.
#[utoipa::path(
    get,
    path = "/pools",
    responses(
        (status = 200, description = "All pools", body = Vec<Pool>),
        (status = 401, description = "Missing or unknown bearer token"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn list_pools(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Pool>>, AppError> {
    Ok(Json(state.store.get_all_pools().await?))
}

#[utoipa::path(
    post,
    path = "/pools",
    request_body = PoolInput,
    responses(
        (status = 201, description = "Pool created", body = Pool),
        (status = 409, description = "Pool name already taken"),
        (status = 422, description = "Invalid pool attributes"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn create_pool(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<PoolInput>,
) -> Result<(StatusCode, Json<Pool>), AppError> {
    let pool = state.store.add_pool(&input).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

#[utoipa::path(
    get,
    path = "/pools/{id}",
    params(("id" = i64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "The pool", body = Pool),
        (status = 404, description = "No such pool"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn get_pool(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Pool>, AppError> {
    Ok(Json(state.store.get_pool_by_id(id).await?))
}

/// Replace every attribute of a pool.
#[utoipa::path(
    put,
    path = "/pools/{id}",
    params(("id" = i64, Path, description = "Pool id")),
    request_body = PoolInput,
    responses(
        (status = 200, description = "Updated pool", body = Pool),
        (status = 404, description = "No such pool"),
        (status = 422, description = "Invalid pool attributes"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn update_pool(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PoolInput>,
) -> Result<Json<Pool>, AppError> {
    let pool = state.store.update_pool(id, &input).await?;
    monitoring::rejoin_pool(&state.store, &state.cache, id).await?;
    Ok(Json(pool))
}

#[utoipa::path(
    put,
    path = "/pools/{id}/status",
    params(("id" = i64, Path, description = "Pool id")),
    request_body = PoolStatusUpdate,
    responses(
        (status = 200, description = "Updated pool", body = Pool),
        (status = 404, description = "No such pool"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn update_pool_status(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PoolStatusUpdate>,
) -> Result<Json<Pool>, AppError> {
    Ok(Json(state.store.update_pool_status(id, body.status).await?))
}

/// Delete a pool that nothing references any more.
#[utoipa::path(
    delete,
    path = "/pools/{id}",
    params(("id" = i64, Path, description = "Pool id")),
    responses(
        (status = 204, description = "Pool deleted"),
        (status = 404, description = "No such pool"),
        (status = 409, description = "Sensors, feedings, catches or reports still reference the pool"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn delete_pool(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_pool(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/pools/{id}/sensors",
    params(("id" = i64, Path, description = "Pool id")),
    responses((status = 200, description = "Sensors installed in the pool", body = Vec<Sensor>)),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn list_pool_sensors(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Sensor>>, AppError> {
    Ok(Json(state.store.get_sensors_by_pool(id).await?))
}

#[utoipa::path(
    get,
    path = "/pools/{id}/catches",
    params(("id" = i64, Path, description = "Pool id")),
    responses((status = 200, description = "Control catches, oldest first", body = Vec<ControlCatch>)),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn list_pool_catches(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ControlCatch>>, AppError> {
    Ok(Json(state.store.get_catches_by_pool(id).await?))
}

#[utoipa::path(
    post,
    path = "/pools/{id}/catches",
    params(("id" = i64, Path, description = "Pool id")),
    request_body = CatchInput,
    responses(
        (status = 201, description = "Catch recorded", body = ControlCatch),
        (status = 409, description = "No such pool"),
        (status = 422, description = "Invalid catch"),
    ),
    security(("bearer" = [])),
    tag = "pools"
)]
pub async fn create_pool_catch(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CatchInput>,
) -> Result<(StatusCode, Json<ControlCatch>), AppError> {
    let row = state.store.add_control_catch(id, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
