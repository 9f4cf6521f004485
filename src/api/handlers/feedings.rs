use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::api::{
    dto::{LimitParams, PeriodParams, StatisticsParams},
    errors::AppError,
    extract::CurrentUser,
    AppState,
};
use crate::db::models::{Feeding, FeedingInput, FeedingRecord, FeedingStatistics};

#[utoipa::path(
    get,
    path = "/feedings",
    params(LimitParams),
    responses((status = 200, description = "Feeding history, newest first", body = Vec<FeedingRecord>)),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn list_feedings(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<FeedingRecord>>, AppError> {
    Ok(Json(state.store.get_feeding_history(params.limit()).await?))
}

#[utoipa::path(
    post,
    path = "/feedings",
    request_body = FeedingInput,
    responses(
        (status = 201, description = "Feeding recorded", body = Feeding),
        (status = 409, description = "Unknown pool"),
        (status = 422, description = "Invalid amount or feed type"),
    ),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn create_feeding(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<FeedingInput>,
) -> Result<(StatusCode, Json<Feeding>), AppError> {
    let feeding = state.store.add_feeding(&input).await?;
    Ok((StatusCode::CREATED, Json(feeding)))
}

/// Kilograms fed today, over the last 7 days and over the last 30 days.
#[utoipa::path(
    get,
    path = "/feedings/statistics",
    params(StatisticsParams),
    responses((status = 200, description = "Rolling totals", body = FeedingStatistics)),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn statistics(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<StatisticsParams>,
) -> Result<Json<FeedingStatistics>, AppError> {
    let at = params.at.unwrap_or_else(Utc::now);
    Ok(Json(state.store.get_feeding_statistics(at).await?))
}

#[utoipa::path(
    get,
    path = "/feedings/period",
    params(PeriodParams),
    responses((status = 200, description = "Feedings in the period, oldest first", body = Vec<FeedingRecord>)),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn period(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<FeedingRecord>>, AppError> {
    let rows = state
        .store
        .get_feeding_data_for_period(params.start, params.end, params.pool_id)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    put,
    path = "/feedings/{id}",
    params(("id" = i64, Path, description = "Feeding id")),
    request_body = FeedingInput,
    responses(
        (status = 200, description = "Updated feeding", body = Feeding),
        (status = 404, description = "No such feeding"),
    ),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn update_feeding(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<FeedingInput>,
) -> Result<Json<Feeding>, AppError> {
    Ok(Json(state.store.update_feeding(id, &input).await?))
}

#[utoipa::path(
    delete,
    path = "/feedings/{id}",
    params(("id" = i64, Path, description = "Feeding id")),
    responses(
        (status = 204, description = "Feeding deleted"),
        (status = 404, description = "No such feeding"),
    ),
    security(("bearer" = [])),
    tag = "feedings"
)]
pub async fn delete_feeding(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_feeding(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::api::test_support::{admin_server, create_pool};

    fn feeding(pool_id: i64, amount: f64, at: &str) -> Value {
        json!({
            "pool_id": pool_id,
            "feed_type": "Pellets 3mm",
            "amount_kg": amount,
            "fed_at": at,
            "method": "manual"
        })
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn statistics_cover_rolling_windows(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;
        let pool_id = create_pool(&server, &token).await;

        for (amount, at) in [
            (2.0, "2024-03-10T07:00:00Z"),
            (3.0, "2024-03-06T07:00:00Z"),
            (5.0, "2024-02-20T07:00:00Z"),
            (7.0, "2024-01-01T07:00:00Z"),
        ] {
            server
                .post("/feedings")
                .authorization_bearer(&token)
                .json(&feeding(pool_id, amount, at))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let stats: Value = server
            .get("/feedings/statistics?at=2024-03-10T12:00:00Z")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(stats["today"], 2.0);
        assert_eq!(stats["week"], 5.0);
        assert_eq!(stats["month"], 10.0);

        let history: Vec<Value> = server
            .get("/feedings?limit=2")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["amount_kg"], 2.0);
        assert_eq!(history[0]["pool_name"], "Pool-A");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_and_delete(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;
        let pool_id = create_pool(&server, &token).await;
        let created: Value = server
            .post("/feedings")
            .authorization_bearer(&token)
            .json(&feeding(pool_id, 2.0, "2024-03-10T07:00:00Z"))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let updated: Value = server
            .put(&format!("/feedings/{id}"))
            .authorization_bearer(&token)
            .json(&feeding(pool_id, 4.5, "2024-03-10T07:00:00Z"))
            .await
            .json();
        assert_eq!(updated["amount_kg"], 4.5);

        server
            .delete(&format!("/feedings/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/feedings/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn oversized_amount_is_rejected(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;
        let pool_id = create_pool(&server, &token).await;
        server
            .post("/feedings")
            .authorization_bearer(&token)
            .json(&feeding(pool_id, 150.0, "2024-03-10T07:00:00Z"))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
