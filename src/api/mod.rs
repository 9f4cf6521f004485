pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;

use std::path::PathBuf;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    db::Store, export::Exporter, reading_cache::ReadingCache, reports::ReportService,
    sessions::SessionStore,
};
use handlers::{admin, auth, catches, feedings, monitoring, pools, reports, sensors, ApiDoc};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: SessionStore,
    pub cache: ReadingCache,
    pub reports: ReportService,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(store: Store, cache: ReadingCache, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions: SessionStore::new(store.clone()),
            reports: ReportService::new(store.clone()),
            exporter: Exporter::new(export_dir),
            cache,
            store,
        }
    }

    pub fn with_session_idle_timeout(mut self, secs: u64) -> Self {
        self.sessions = self.sessions.with_idle_timeout(secs);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/health", get(handlers::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/pools", get(pools::list_pools).post(pools::create_pool))
        .route(
            "/pools/{id}",
            get(pools::get_pool)
                .put(pools::update_pool)
                .delete(pools::delete_pool),
        )
        .route("/pools/{id}/status", put(pools::update_pool_status))
        .route("/pools/{id}/sensors", get(pools::list_pool_sensors))
        .route(
            "/pools/{id}/catches",
            get(pools::list_pool_catches).post(pools::create_pool_catch),
        )
        .route("/sensors", get(sensors::list_sensors).post(sensors::create_sensor))
        .route(
            "/sensors/{id}",
            get(sensors::get_sensor)
                .put(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route(
            "/sensors/{id}/readings",
            get(sensors::list_sensor_readings).post(sensors::create_sensor_reading),
        )
        .route("/monitoring/latest", get(monitoring::latest))
        .route("/monitoring/recent", get(monitoring::recent))
        .route("/monitoring/period", get(monitoring::period))
        .route("/monitoring/statistics", get(monitoring::statistics))
        .route("/feedings", get(feedings::list_feedings).post(feedings::create_feeding))
        .route("/feedings/statistics", get(feedings::statistics))
        .route("/feedings/period", get(feedings::period))
        .route(
            "/feedings/{id}",
            put(feedings::update_feeding).delete(feedings::delete_feeding),
        )
        .route("/catches/period", get(catches::period))
        .route("/catches/{id}", delete(catches::delete_catch))
        .route("/reports", get(reports::list_reports).post(reports::create_report))
        .route("/reports/types", get(reports::list_report_types))
        .route("/reports/export", post(reports::export_reports))
        .route(
            "/reports/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route("/admin/tables", get(admin::list_tables))
        .route("/admin/tables/{table}", get(admin::get_table))
        .route("/admin/tables/{table}/export", post(admin::export_table))
        .route("/admin/schema/export", post(admin::export_schema))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/roles", get(admin::list_roles))
        .with_state(state)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use super::*;
    use crate::auth::MIN_COST;

    pub fn pool_a() -> Value {
        json!({
            "name": "Pool-A",
            "volume": 50.0,
            "species": "Trout",
            "fish_count": 5000,
            "stocked_on": "2024-01-15",
            "status": "active"
        })
    }

    /// Server with a seeded `admin`/`admin` account, plus its session token.
    pub async fn admin_server(pool: SqlitePool) -> (TestServer, String) {
        admin_server_in(pool, std::env::temp_dir()).await
    }

    pub async fn admin_server_in(
        pool: SqlitePool,
        export_dir: impl AsRef<Path>,
    ) -> (TestServer, String) {
        let store = Store::new(pool).with_password_cost(MIN_COST);
        store.seed_admin("admin", "admin").await.unwrap();
        let state = AppState::new(store, ReadingCache::new(), export_dir.as_ref());
        let server = TestServer::new(router(state)).unwrap();
        let token = login(&server, "admin", "admin").await;
        (server, token)
    }

    pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
        let resp = server
            .post("/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        resp.assert_status_ok();
        resp.json::<Value>()["token"].as_str().unwrap().to_owned()
    }

    pub async fn create_pool(server: &TestServer, token: &str) -> i64 {
        let created: Value = server
            .post("/pools")
            .authorization_bearer(token)
            .json(&pool_a())
            .await
            .json();
        created["id"].as_i64().unwrap()
    }

    /// Temperature sensor with a normal range of 18 to 24.
    pub async fn create_sensor(server: &TestServer, token: &str, pool_id: i64) -> i64 {
        let created: Value = server
            .post("/sensors")
            .authorization_bearer(token)
            .json(&json!({
                "pool_id": pool_id,
                "sensor_type": "temperature",
                "model": "TMP-1",
                "range_min": 18.0,
                "range_max": 24.0,
                "installed_on": "2024-01-16"
            }))
            .await
            .json();
        created["id"].as_i64().unwrap()
    }
}
