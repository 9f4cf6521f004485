use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::{
    dto::{ExportRequest, ExportResponse, ReportExportRequest, ReportListParams},
    errors::AppError,
    extract::CurrentUser,
    AppState,
};
use crate::{
    db::models::{Report, ReportKind, ReportSummary},
    reports::ReportRequest,
};

/// Reports whose period overlaps `[start, end]`, newest first.
#[utoipa::path(
    get,
    path = "/reports",
    params(ReportListParams),
    responses((status = 200, description = "Matching reports", body = Vec<ReportSummary>)),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let rows = state
        .store
        .get_reports_data(params.kind, params.start, params.end)
        .await?;
    Ok(Json(rows))
}

/// Form a report authored by the caller.
#[utoipa::path(
    post,
    path = "/reports",
    request_body = ReportRequest,
    responses(
        (status = 201, description = "Report stored", body = Report),
        (status = 404, description = "No such pool"),
        (status = 422, description = "Empty notes or reversed period"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn create_report(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<(StatusCode, Json<Report>), AppError> {
    let report = state.reports.generate(&session.user, &request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/reports/types",
    responses((status = 200, description = "Kinds with at least one stored report", body = Vec<ReportKind>)),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn list_report_types(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportKind>>, AppError> {
    Ok(Json(state.store.get_all_report_types().await?))
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "The report", body = Report),
        (status = 404, description = "No such report"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn get_report(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(state.store.get_report_by_id(id).await?))
}

#[utoipa::path(
    delete,
    path = "/reports/{id}",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 404, description = "No such report"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn delete_report(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_report(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Write the filtered report list to a workbook in the export directory.
#[utoipa::path(
    post,
    path = "/reports/export",
    request_body = ReportExportRequest,
    responses(
        (status = 200, description = "Workbook written", body = ExportResponse),
        (status = 422, description = "No reports match or bad file name"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn export_reports(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ReportExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let target = ExportRequest {
        file_name: body.file_name,
    }
    .target()?;
    let reports = state
        .store
        .get_reports_data(body.kind, body.start, body.end)
        .await?;

    let exporter = state.exporter.clone();
    let path = tokio::task::spawn_blocking(move || {
        exporter.export_reports(&reports, target.as_deref())
    })
    .await??;

    Ok(Json(ExportResponse {
        path: path.display().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::api::test_support::{admin_server_in, create_pool};

    #[sqlx::test(migrations = "./migrations")]
    async fn report_flow_from_creation_to_export(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let (server, token) = admin_server_in(pool, dir.path()).await;
        let pool_id = create_pool(&server, &token).await;

        let resp = server
            .post("/reports")
            .authorization_bearer(&token)
            .json(&json!({
                "kind": "technological",
                "pool_id": pool_id,
                "period_start": "2024-05-01",
                "period_end": "2024-05-07",
                "notes": "Filters replaced"
            }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let report: Value = resp.json();
        let id = report["id"].as_i64().unwrap();
        assert!(report["body"].as_str().unwrap().ends_with("Filters replaced"));

        let types: Vec<String> = server
            .get("/reports/types")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(types, vec!["technological".to_owned()]);

        let listed: Vec<Value> = server
            .get("/reports?start=2024-05-05&end=2024-05-20")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["pool_name"], "Pool-A");

        let resp = server
            .post("/reports/export")
            .authorization_bearer(&token)
            .json(&json!({ "start": "2024-05-01", "end": "2024-05-31", "file_name": "reports" }))
            .await;
        resp.assert_status_ok();
        let path = resp.json::<Value>()["path"].as_str().unwrap().to_owned();
        assert!(path.ends_with("reports.xlsx"));
        assert!(dir.path().join("reports.xlsx").exists());

        server
            .delete(&format!("/reports/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/reports/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn blank_notes_and_empty_exports_are_unprocessable(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let (server, token) = admin_server_in(pool, dir.path()).await;
        let pool_id = create_pool(&server, &token).await;

        server
            .post("/reports")
            .authorization_bearer(&token)
            .json(&json!({
                "kind": "daily_monitoring",
                "pool_id": pool_id,
                "period_start": "2024-05-01",
                "period_end": "2024-05-01",
                "notes": "   "
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        server
            .post("/reports/export")
            .authorization_bearer(&token)
            .json(&json!({ "start": "2024-05-01", "end": "2024-05-31" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
