use axum::{extract::State, http::StatusCode, Json};

use crate::api::{
    dto::{LoginRequest, LoginResponse},
    errors::AppError,
    extract::CurrentUser,
    AppState,
};
use crate::sessions::Session;

/// Check credentials and open a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state.sessions.login(&body.username, &body.password).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        user: session.user,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Missing or unknown bearer token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.sessions.logout(session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "The caller's session", body = Session)),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(CurrentUser(session): CurrentUser) -> Json<Session> {
    Json(session)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::api::test_support::admin_server;

    #[sqlx::test(migrations = "./migrations")]
    async fn wrong_password_is_unauthorized(pool: SqlitePool) {
        let (server, _) = admin_server(pool).await;
        server
            .post("/auth/login")
            .json(&json!({ "username": "admin", "password": "nope" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn me_then_logout_invalidates_token(pool: SqlitePool) {
        let (server, token) = admin_server(pool).await;

        let me: Value = server.get("/auth/me").authorization_bearer(&token).await.json();
        assert_eq!(me["user"]["username"], "admin");
        assert_eq!(me["user"]["is_admin"], true);
        assert_eq!(me["user"]["status"], "active");

        server
            .post("/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
