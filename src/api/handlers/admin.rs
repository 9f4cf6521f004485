//! Administrator-only endpoints: raw table browsing, spreadsheet export and
//! account management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::{
    dto::{ExportRequest, ExportResponse},
    errors::AppError,
    extract::AdminUser,
    AppState,
};
use crate::db::{
    models::{NewUser, Role, User},
    tables::{Table, TableData},
};

#[utoipa::path(
    get,
    path = "/admin/tables",
    responses(
        (status = 200, description = "Application table names", body = Vec<String>),
        (status = 403, description = "Caller is not an administrator"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_tables(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.get_table_names().await?))
}

/// Every row of one table. Password hashes are never returned.
#[utoipa::path(
    get,
    path = "/admin/tables/{table}",
    params(("table" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Columns and rows", body = TableData),
        (status = 422, description = "Unknown table"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn get_table(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<TableData>, AppError> {
    let table: Table = table.parse()?;
    Ok(Json(state.store.get_all_data(table).await?))
}

#[utoipa::path(
    post,
    path = "/admin/tables/{table}/export",
    params(("table" = String, Path, description = "Table name")),
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Workbook written", body = ExportResponse),
        (status = 422, description = "Unknown or empty table, or bad file name"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn export_table(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let table: Table = table.parse()?;
    let target = body.target()?;
    let data = state.store.get_all_data(table).await?;

    let exporter = state.exporter.clone();
    let path = tokio::task::spawn_blocking(move || {
        exporter.export_table(&data, target.as_deref(), table.as_str())
    })
    .await??;

    Ok(Json(ExportResponse {
        path: path.display().to_string(),
    }))
}

/// One sheet per table describing its columns.
#[utoipa::path(
    post,
    path = "/admin/schema/export",
    request_body = ExportRequest,
    responses((status = 200, description = "Workbook written", body = ExportResponse)),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn export_schema(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let target = body.target()?;
    let path = state
        .exporter
        .export_schema(&state.store, target.as_deref())
        .await?;
    Ok(Json(ExportResponse {
        path: path.display().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All accounts", body = Vec<User>)),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.store.get_all_users().await?))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 409, description = "Username taken or unknown role"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn create_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let created = state.store.add_user(&user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/admin/roles",
    responses((status = 200, description = "All roles", body = Vec<Role>)),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_roles(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.store.get_all_roles().await?))
}
