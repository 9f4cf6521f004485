use tracing::info;

use super::{
    error::{StoreError, StoreResult},
    models::{Sensor, SensorInput},
    Store,
};

const SENSOR_COLUMNS: &str = "id, pool_id, sensor_type, model, range_min, range_max, installed_on";

impl Store {
    pub async fn add_sensor(&self, input: &SensorInput) -> StoreResult<Sensor> {
        input.validate()?;
        let sensor = sqlx::query_as::<_, Sensor>(&format!(
            r#"
            INSERT INTO sensors (pool_id, sensor_type, model, range_min, range_max, installed_on)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {SENSOR_COLUMNS}
            "#
        ))
        .bind(input.pool_id)
        .bind(input.sensor_type)
        .bind(input.model.trim())
        .bind(input.range_min)
        .bind(input.range_max)
        .bind(input.installed_on)
        .fetch_one(&self.pool)
        .await?;

        info!(
            sensor_id = sensor.id,
            pool_id = sensor.pool_id,
            sensor_type = %sensor.sensor_type,
            "Sensor added"
        );
        Ok(sensor)
    }

    pub async fn get_sensor_by_id(&self, id: i64) -> StoreResult<Sensor> {
        sqlx::query_as::<_, Sensor>(&format!("SELECT {SENSOR_COLUMNS} FROM sensors WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("sensor", id))
    }

    pub async fn get_sensors_by_pool(&self, pool_id: i64) -> StoreResult<Vec<Sensor>> {
        let rows = sqlx::query_as::<_, Sensor>(&format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors WHERE pool_id = ?1 ORDER BY id"
        ))
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_all_sensors(&self) -> StoreResult<Vec<Sensor>> {
        let rows = sqlx::query_as::<_, Sensor>(&format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors ORDER BY pool_id, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update_sensor(&self, id: i64, input: &SensorInput) -> StoreResult<Sensor> {
        input.validate()?;
        let sensor = sqlx::query_as::<_, Sensor>(&format!(
            r#"
            UPDATE sensors
            SET pool_id = ?1, sensor_type = ?2, model = ?3,
                range_min = ?4, range_max = ?5, installed_on = ?6
            WHERE id = ?7
            RETURNING {SENSOR_COLUMNS}
            "#
        ))
        .bind(input.pool_id)
        .bind(input.sensor_type)
        .bind(input.model.trim())
        .bind(input.range_min)
        .bind(input.range_max)
        .bind(input.installed_on)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("sensor", id))?;

        info!(sensor_id = id, "Sensor updated");
        Ok(sensor)
    }

    /// Deletes a sensor. Fails with `ConstraintViolation` while readings exist.
    pub async fn delete_sensor(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sensors WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("sensor", id));
        }
        info!(sensor_id = id, "Sensor deleted");
        Ok(())
    }
}
