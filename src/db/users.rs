use chrono::Utc;
use sqlx::FromRow;
use tracing::{info, warn};

use super::{
    error::{StoreError, StoreResult},
    models::{AuthenticatedUser, NewUser, Role, User, UserStatus},
    Store,
};
use crate::auth;

#[derive(FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    patronymic: Option<String>,
    role_id: i64,
    role_name: String,
    is_admin: bool,
    status: UserStatus,
}

impl Store {
    /// Look up `username` and verify `password` against its bcrypt hash.
    ///
    /// Returns `Ok(None)` for an unknown user or a wrong password.
    pub async fn check_user(
        &self,
        username: &str,
        password: &str,
    ) -> StoreResult<Option<AuthenticatedUser>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT u.id, u.username, u.password_hash,
                   u.first_name, u.last_name, u.patronymic,
                   u.role_id, r.name AS role_name, r.is_admin,
                   u.status
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let verified = auth::verify_password(password, &row.password_hash).await?;
        if !verified {
            warn!(username = %username, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(AuthenticatedUser {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            patronymic: row.patronymic,
            role_id: row.role_id,
            role_name: row.role_name,
            is_admin: row.is_admin,
            status: row.status,
        }))
    }

    pub async fn update_user_status_by_id(&self, id: i64, status: UserStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET status = ?1 WHERE id = ?2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        info!(user_id = id, status = ?status, "User status updated");
        Ok(())
    }

    /// Marks every account as disconnected. Returns the number of rows touched.
    pub async fn logout_all_users(&self) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE users SET status = ?1 WHERE status <> ?1")
            .bind(UserStatus::Disconnected)
            .execute(&self.pool)
            .await?;
        info!(users = result.rows_affected(), "All users marked disconnected");
        Ok(result.rows_affected())
    }

    pub async fn add_user(&self, user: &NewUser) -> StoreResult<User> {
        user.validate()?;
        let hash = auth::hash_password(&user.password, self.password_cost).await?;

        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (username, password_hash, first_name, last_name, patronymic, role_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, username, first_name, last_name, patronymic, role_id, status, created_at
            "#,
        )
        .bind(user.username.trim())
        .bind(hash)
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.patronymic.as_deref().map(str::trim))
        .bind(user.role_id)
        .bind(UserStatus::Disconnected)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = row.id, username = %row.username, "User added");
        Ok(row)
    }

    pub async fn get_user_by_id(&self, id: i64) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, patronymic, role_id, status, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("user", id))
    }

    pub async fn get_all_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, patronymic, role_id, status, created_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_all_roles(&self) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, is_admin FROM roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
