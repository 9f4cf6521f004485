use tracing::info;

use super::{
    error::{StoreError, StoreResult},
    models::{Pool, PoolInput, PoolStatus},
    Store,
};

const POOL_COLUMNS: &str = "id, name, volume, species, fish_count, stocked_on, status";

impl Store {
    pub async fn add_pool(&self, input: &PoolInput) -> StoreResult<Pool> {
        input.validate()?;
        let pool = sqlx::query_as::<_, Pool>(&format!(
            r#"
            INSERT INTO pools (name, volume, species, fish_count, stocked_on, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {POOL_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.volume)
        .bind(input.species.trim())
        .bind(input.fish_count)
        .bind(input.stocked_on)
        .bind(input.status)
        .fetch_one(&self.pool)
        .await?;

        info!(pool_id = pool.id, name = %pool.name, "Pool added");
        Ok(pool)
    }

    pub async fn get_pool_by_id(&self, id: i64) -> StoreResult<Pool> {
        sqlx::query_as::<_, Pool>(&format!("SELECT {POOL_COLUMNS} FROM pools WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("pool", id))
    }

    pub async fn get_all_pools(&self) -> StoreResult<Vec<Pool>> {
        let rows = sqlx::query_as::<_, Pool>(&format!(
            "SELECT {POOL_COLUMNS} FROM pools ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Full-row update keyed by id.
    pub async fn update_pool(&self, id: i64, input: &PoolInput) -> StoreResult<Pool> {
        input.validate()?;
        let pool = sqlx::query_as::<_, Pool>(&format!(
            r#"
            UPDATE pools
            SET name = ?1, volume = ?2, species = ?3, fish_count = ?4, stocked_on = ?5, status = ?6
            WHERE id = ?7
            RETURNING {POOL_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.volume)
        .bind(input.species.trim())
        .bind(input.fish_count)
        .bind(input.stocked_on)
        .bind(input.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("pool", id))?;

        info!(pool_id = id, "Pool updated");
        Ok(pool)
    }

    pub async fn update_pool_status(&self, id: i64, status: PoolStatus) -> StoreResult<Pool> {
        let pool = sqlx::query_as::<_, Pool>(&format!(
            "UPDATE pools SET status = ?1 WHERE id = ?2 RETURNING {POOL_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("pool", id))?;

        info!(pool_id = id, status = ?status, "Pool status updated");
        Ok(pool)
    }

    /// Deletes a pool. Fails with `ConstraintViolation` while sensors,
    /// feedings, catches or reports still reference it.
    pub async fn delete_pool(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM pools WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("pool", id));
        }
        info!(pool_id = id, "Pool deleted");
        Ok(())
    }
}
