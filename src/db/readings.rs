use chrono::{NaiveDate, Utc};
use tracing::info;

use super::{
    error::{StoreError, StoreResult},
    models::{MonitoringReading, NewReading, SensorReading, SensorStatistics},
    period_bounds, Store,
};

const MONITORING_SELECT: &str = r#"
    SELECT r.id, r.sensor_id, s.pool_id, p.name AS pool_name, s.sensor_type,
           r.value, r.recorded_at, r.status
    FROM sensor_readings r
    JOIN sensors s ON s.id = r.sensor_id
    JOIN pools p   ON p.id = s.pool_id
"#;

impl Store {
    /// Record one reading for `sensor_id`.
    ///
    /// A caller-supplied status is stored as given; otherwise it is derived
    /// from the sensor's declared range. Values are rounded to two decimals.
    pub async fn add_sensor_reading(
        &self,
        sensor_id: i64,
        reading: &NewReading,
    ) -> StoreResult<SensorReading> {
        reading.validate()?;
        let sensor = self.get_sensor_by_id(sensor_id).await?;

        let value = (reading.value * 100.0).round() / 100.0;
        let status = reading.status.unwrap_or_else(|| sensor.classify(value));
        let recorded_at = reading.recorded_at.unwrap_or_else(Utc::now);

        let row = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (sensor_id, value, recorded_at, status)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, sensor_id, value, recorded_at, status
            "#,
        )
        .bind(sensor_id)
        .bind(value)
        .bind(recorded_at)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        info!(sensor_id, value, status = %status, "Sensor reading recorded");
        Ok(row)
    }

    /// One stored reading joined with its sensor and pool.
    pub async fn get_monitoring_reading(&self, id: i64) -> StoreResult<MonitoringReading> {
        sqlx::query_as::<_, MonitoringReading>(&format!("{MONITORING_SELECT} WHERE r.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("sensor reading", id))
    }

    /// The `limit` most recent readings of one sensor, newest first.
    pub async fn get_sensor_readings(
        &self,
        sensor_id: i64,
        limit: u32,
    ) -> StoreResult<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, value, recorded_at, status
            FROM sensor_readings
            WHERE sensor_id = ?1
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(sensor_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The `limit` most recent readings across all sensors (optionally of one
    /// pool), newest first.
    pub async fn get_latest_sensor_readings(
        &self,
        pool_id: Option<i64>,
        limit: u32,
    ) -> StoreResult<Vec<MonitoringReading>> {
        let rows = sqlx::query_as::<_, MonitoringReading>(&format!(
            r#"
            {MONITORING_SELECT}
            WHERE (?1 IS NULL OR s.pool_id = ?1)
            ORDER BY r.recorded_at DESC, r.id DESC
            LIMIT ?2
            "#
        ))
        .bind(pool_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Exactly one row per sensor that has readings: its most recent one.
    pub async fn get_latest_reading_per_sensor(&self) -> StoreResult<Vec<MonitoringReading>> {
        let rows = sqlx::query_as::<_, MonitoringReading>(&format!(
            r#"
            {MONITORING_SELECT}
            WHERE r.id = (
                SELECT r2.id FROM sensor_readings r2
                WHERE r2.sensor_id = r.sensor_id
                ORDER BY r2.recorded_at DESC, r2.id DESC
                LIMIT 1
            )
            ORDER BY s.pool_id, r.sensor_id
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Readings recorded on any day in `[start, end]`, oldest first.
    pub async fn get_monitoring_data_for_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        pool_id: Option<i64>,
    ) -> StoreResult<Vec<MonitoringReading>> {
        let (from, to) = period_bounds(start, end)?;
        let rows = sqlx::query_as::<_, MonitoringReading>(&format!(
            r#"
            {MONITORING_SELECT}
            WHERE r.recorded_at >= ?1 AND r.recorded_at < ?2
              AND (?3 IS NULL OR s.pool_id = ?3)
            ORDER BY r.recorded_at ASC, r.id ASC
            "#
        ))
        .bind(from)
        .bind(to)
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Per sensor type aggregates over readings in `[start, end]`.
    pub async fn get_sensor_statistics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<SensorStatistics>> {
        let (from, to) = period_bounds(start, end)?;
        let rows = sqlx::query_as::<_, SensorStatistics>(
            r#"
            SELECT s.sensor_type,
                   COUNT(*)                                             AS readings,
                   MIN(r.value)                                         AS min_value,
                   MAX(r.value)                                         AS max_value,
                   AVG(r.value)                                         AS avg_value,
                   SUM(CASE WHEN r.status = 'warning'  THEN 1 ELSE 0 END) AS warnings,
                   SUM(CASE WHEN r.status = 'critical' THEN 1 ELSE 0 END) AS criticals
            FROM sensor_readings r
            JOIN sensors s ON s.id = r.sensor_id
            WHERE r.recorded_at >= ?1 AND r.recorded_at < ?2
            GROUP BY s.sensor_type
            ORDER BY s.sensor_type
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
