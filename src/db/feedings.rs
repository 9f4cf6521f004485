use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::info;

use super::{
    day_start,
    error::{StoreError, StoreResult},
    models::{Feeding, FeedingInput, FeedingRecord, FeedingStatistics},
    period_bounds, Store,
};

const FEEDING_COLUMNS: &str = "id, pool_id, feed_type, amount_kg, fed_at, method";

const RECORD_SELECT: &str = r#"
    SELECT f.id, f.pool_id, p.name AS pool_name, f.feed_type, f.amount_kg, f.fed_at, f.method
    FROM feedings f
    JOIN pools p ON p.id = f.pool_id
"#;

impl Store {
    pub async fn add_feeding(&self, input: &FeedingInput) -> StoreResult<Feeding> {
        input.validate()?;
        let fed_at = input.fed_at.unwrap_or_else(Utc::now);
        let feeding = sqlx::query_as::<_, Feeding>(&format!(
            r#"
            INSERT INTO feedings (pool_id, feed_type, amount_kg, fed_at, method)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {FEEDING_COLUMNS}
            "#
        ))
        .bind(input.pool_id)
        .bind(input.feed_type.trim())
        .bind(input.amount_kg)
        .bind(fed_at)
        .bind(input.method)
        .fetch_one(&self.pool)
        .await?;

        info!(
            feeding_id = feeding.id,
            pool_id = feeding.pool_id,
            amount_kg = feeding.amount_kg,
            "Feeding recorded"
        );
        Ok(feeding)
    }

    /// Most recent feedings across all pools.
    pub async fn get_feeding_history(&self, limit: u32) -> StoreResult<Vec<FeedingRecord>> {
        let rows = sqlx::query_as::<_, FeedingRecord>(&format!(
            "{RECORD_SELECT} ORDER BY f.fed_at DESC, f.id DESC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_feeding_data_for_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        pool_id: Option<i64>,
    ) -> StoreResult<Vec<FeedingRecord>> {
        let (from, to) = period_bounds(start, end)?;
        let rows = sqlx::query_as::<_, FeedingRecord>(&format!(
            r#"
            {RECORD_SELECT}
            WHERE f.fed_at >= ?1 AND f.fed_at < ?2
              AND (?3 IS NULL OR f.pool_id = ?3)
            ORDER BY f.fed_at ASC, f.id ASC
            "#
        ))
        .bind(from)
        .bind(to)
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Kilograms fed since 00:00 today, over the last 7 and the last 30 days
    /// (both counted in whole days including today), all ending at `now`.
    pub async fn get_feeding_statistics(
        &self,
        now: DateTime<Utc>,
    ) -> StoreResult<FeedingStatistics> {
        let today = now.date_naive();
        let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
        let month_start = today.checked_sub_days(Days::new(29)).unwrap_or(today);

        Ok(FeedingStatistics {
            today: self.feeding_total(day_start(today), now).await?,
            week: self.feeding_total(day_start(week_start), now).await?,
            month: self.feeding_total(day_start(month_start), now).await?,
        })
    }

    async fn feeding_total(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<f64> {
        let (total,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount_kg), 0.0) FROM feedings WHERE fed_at >= ?1 AND fed_at <= ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn update_feeding(&self, id: i64, input: &FeedingInput) -> StoreResult<Feeding> {
        input.validate()?;
        let current = self.get_feeding_by_id(id).await?;
        let fed_at = input.fed_at.unwrap_or(current.fed_at);

        let feeding = sqlx::query_as::<_, Feeding>(&format!(
            r#"
            UPDATE feedings
            SET pool_id = ?1, feed_type = ?2, amount_kg = ?3, fed_at = ?4, method = ?5
            WHERE id = ?6
            RETURNING {FEEDING_COLUMNS}
            "#
        ))
        .bind(input.pool_id)
        .bind(input.feed_type.trim())
        .bind(input.amount_kg)
        .bind(fed_at)
        .bind(input.method)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("feeding", id))?;

        info!(feeding_id = id, "Feeding updated");
        Ok(feeding)
    }

    pub async fn get_feeding_by_id(&self, id: i64) -> StoreResult<Feeding> {
        sqlx::query_as::<_, Feeding>(&format!(
            "SELECT {FEEDING_COLUMNS} FROM feedings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("feeding", id))
    }

    pub async fn delete_feeding(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM feedings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("feeding", id));
        }
        info!(feeding_id = id, "Feeding deleted");
        Ok(())
    }
}
