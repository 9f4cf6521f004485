use chrono::NaiveDate;
use tracing::info;

use super::{
    error::{StoreError, StoreResult},
    models::{CatchInput, ControlCatch, GrowthRecord},
    Store,
};

const CATCH_COLUMNS: &str = "id, pool_id, average_weight_g, fish_count, caught_on, note";

impl Store {
    pub async fn add_control_catch(
        &self,
        pool_id: i64,
        input: &CatchInput,
    ) -> StoreResult<ControlCatch> {
        input.validate()?;
        let note = input
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let row = sqlx::query_as::<_, ControlCatch>(&format!(
            r#"
            INSERT INTO control_catches (pool_id, average_weight_g, fish_count, caught_on, note)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {CATCH_COLUMNS}
            "#
        ))
        .bind(pool_id)
        .bind(input.average_weight_g)
        .bind(input.fish_count)
        .bind(input.caught_on)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        info!(catch_id = row.id, pool_id, "Control catch recorded");
        Ok(row)
    }

    /// Catches of one pool, oldest first.
    pub async fn get_catches_by_pool(&self, pool_id: i64) -> StoreResult<Vec<ControlCatch>> {
        let rows = sqlx::query_as::<_, ControlCatch>(&format!(
            "SELECT {CATCH_COLUMNS} FROM control_catches WHERE pool_id = ?1 ORDER BY caught_on, id"
        ))
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Catches dated within `[start, end]` inclusive.
    pub async fn get_growth_data_for_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        pool_id: Option<i64>,
    ) -> StoreResult<Vec<GrowthRecord>> {
        if start > end {
            return Err(StoreError::validation("period start must not be after period end"));
        }
        let rows = sqlx::query_as::<_, GrowthRecord>(
            r#"
            SELECT c.id, c.pool_id, p.name AS pool_name, p.species,
                   c.average_weight_g, c.fish_count, c.caught_on, c.note
            FROM control_catches c
            JOIN pools p ON p.id = c.pool_id
            WHERE c.caught_on >= ?1 AND c.caught_on <= ?2
              AND (?3 IS NULL OR c.pool_id = ?3)
            ORDER BY c.caught_on, c.id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_control_catch(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM control_catches WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("control catch", id));
        }
        info!(catch_id = id, "Control catch deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::models::{PoolInput, PoolStatus};

    async fn seed_pool(store: &Store, name: &str) -> i64 {
        store
            .add_pool(&PoolInput {
                name: name.into(),
                volume: 60.0,
                species: "Sturgeon".into(),
                fish_count: 300,
                stocked_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                status: PoolStatus::Active,
            })
            .await
            .unwrap()
            .id
    }

    fn catch_on(day: u32, weight: f64) -> CatchInput {
        CatchInput {
            average_weight_g: weight,
            fish_count: 20,
            caught_on: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            note: Some("  ".into()),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn catches_list_per_pool_in_date_order(pool: SqlitePool) {
        let store = Store::new(pool);
        let a = seed_pool(&store, "A").await;
        store.add_control_catch(a, &catch_on(20, 310.0)).await.unwrap();
        store.add_control_catch(a, &catch_on(5, 250.0)).await.unwrap();

        let rows = store.get_catches_by_pool(a).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].average_weight_g, 250.0);
        // Blank notes are stored as NULL.
        assert_eq!(rows[0].note, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn growth_period_is_inclusive_and_filterable(pool: SqlitePool) {
        let store = Store::new(pool);
        let a = seed_pool(&store, "A").await;
        let b = seed_pool(&store, "B").await;
        store.add_control_catch(a, &catch_on(1, 200.0)).await.unwrap();
        store.add_control_catch(a, &catch_on(10, 240.0)).await.unwrap();
        store.add_control_catch(b, &catch_on(10, 900.0)).await.unwrap();
        store.add_control_catch(a, &catch_on(11, 245.0)).await.unwrap();

        let from = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

        let all = store.get_growth_data_for_period(from, to, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].species, "Sturgeon");

        let only_a = store.get_growth_data_for_period(from, to, Some(a)).await.unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|r| r.pool_name == "A"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn invalid_catch_is_rejected(pool: SqlitePool) {
        let store = Store::new(pool);
        let a = seed_pool(&store, "A").await;
        let err = store.add_control_catch(a, &catch_on(1, 0.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_catch(pool: SqlitePool) {
        let store = Store::new(pool);
        let a = seed_pool(&store, "A").await;
        let c = store.add_control_catch(a, &catch_on(1, 200.0)).await.unwrap();
        store.delete_control_catch(c.id).await.unwrap();
        assert!(store.get_catches_by_pool(a).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_control_catch(c.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
