use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::{dto::PeriodParams, errors::AppError, extract::CurrentUser, AppState};
use crate::db::models::GrowthRecord;

/// Control catches in the period, joined with pool name and species.
#[utoipa::path(
    get,
    path = "/catches/period",
    params(PeriodParams),
    responses((status = 200, description = "Growth records, oldest first", body = Vec<GrowthRecord>)),
    security(("bearer" = [])),
    tag = "catches"
)]
pub async fn period(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<GrowthRecord>>, AppError> {
    let rows = state
        .store
        .get_growth_data_for_period(params.start, params.end, params.pool_id)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    delete,
    path = "/catches/{id}",
    params(("id" = i64, Path, description = "Control catch id")),
    responses(
        (status = 204, description = "Catch deleted"),
        (status = 404, description = "No such catch"),
    ),
    security(("bearer" = [])),
    tag = "catches"
)]
pub async fn delete_catch(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_control_catch(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
