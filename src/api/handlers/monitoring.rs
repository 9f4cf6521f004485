use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::{
    dto::{DateRangeParams, PeriodParams, PoolFilterParams},
    errors::AppError,
    extract::CurrentUser,
    AppState,
};
use crate::db::models::{MonitoringReading, SensorStatistics};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestParams {
    pub pool_id: Option<i64>,
}

/// Latest reading of every sensor, served from the in-memory cache.
#[utoipa::path(
    get,
    path = "/monitoring/latest",
    params(LatestParams),
    responses((status = 200, description = "One reading per sensor", body = Vec<MonitoringReading>)),
    security(("bearer" = [])),
    tag = "monitoring"
)]
pub async fn latest(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Json<Vec<MonitoringReading>> {
    let readings = match params.pool_id {
        Some(pool_id) => state.cache.for_pool(pool_id).await,
        None => state.cache.all().await,
    };
    Json(readings)
}

/// Most recent readings across sensors, newest first.
#[utoipa::path(
    get,
    path = "/monitoring/recent",
    params(PoolFilterParams),
    responses((status = 200, description = "Recent readings", body = Vec<MonitoringReading>)),
    security(("bearer" = [])),
    tag = "monitoring"
)]
pub async fn recent(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PoolFilterParams>,
) -> Result<Json<Vec<MonitoringReading>>, AppError> {
    let rows = state
        .store
        .get_latest_sensor_readings(params.pool_id, params.limit())
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/monitoring/period",
    params(PeriodParams),
    responses(
        (status = 200, description = "Readings in the period, oldest first", body = Vec<MonitoringReading>),
        (status = 422, description = "start is after end"),
    ),
    security(("bearer" = [])),
    tag = "monitoring"
)]
pub async fn period(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<MonitoringReading>>, AppError> {
    let rows = state
        .store
        .get_monitoring_data_for_period(params.start, params.end, params.pool_id)
        .await?;
    Ok(Json(rows))
}

/// Aggregates per sensor type across all pools.
#[utoipa::path(
    get,
    path = "/monitoring/statistics",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Per-type aggregates", body = Vec<SensorStatistics>),
        (status = 422, description = "start is after end"),
    ),
    security(("bearer" = [])),
    tag = "monitoring"
)]
pub async fn statistics(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<SensorStatistics>>, AppError> {
    Ok(Json(state.store.get_sensor_statistics(params.start, params.end).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use utoipa::OpenApi;

    use crate::api::{
        handlers::ApiDoc,
        test_support::{admin_server, create_pool, create_sensor},
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_reflects_recorded_readings(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;
        let pool_id = create_pool(&server, &token).await;
        let sensor_id = create_sensor(&server, &token, pool_id).await;

        for (value, at) in [(20.0, "2024-03-01T08:00:00Z"), (21.5, "2024-03-01T09:00:00Z")] {
            server
                .post(&format!("/sensors/{sensor_id}/readings"))
                .authorization_bearer(&token)
                .json(&json!({ "value": value, "recorded_at": at }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let latest: Vec<Value> = server
            .get(&format!("/monitoring/latest?pool_id={pool_id}"))
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0]["value"], 21.5);

        let other: Vec<Value> = server
            .get("/monitoring/latest?pool_id=999")
            .authorization_bearer(&token)
            .await
            .json();
        assert!(other.is_empty());

        let period: Vec<Value> = server
            .get("/monitoring/period?start=2024-03-01&end=2024-03-01")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(period.len(), 2);
        assert_eq!(period[0]["value"], 20.0);

        let stats: Vec<Value> = server
            .get("/monitoring/statistics?start=2024-03-01&end=2024-03-31")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0]["sensor_type"], "temperature");
        assert_eq!(stats[0]["readings"], 2);
    }

    #[test]
    fn statistics_takes_only_a_date_range() {
        let doc = ApiDoc::openapi();
        let op = doc.paths.paths["/monitoring/statistics"].get.as_ref().unwrap();
        let names: Vec<&str> = op
            .parameters
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["start", "end"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reversed_period_is_unprocessable(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;
        server
            .get("/monitoring/period?start=2024-03-02&end=2024-03-01")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
