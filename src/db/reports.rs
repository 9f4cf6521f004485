use chrono::NaiveDate;
use tracing::info;

use super::{
    error::{StoreError, StoreResult},
    models::{NewReport, Report, ReportKind, ReportSummary},
    Store,
};

const REPORT_COLUMNS: &str =
    "id, pool_id, author_id, report_type, period_start, period_end, formed_at, body";

impl Store {
    pub async fn add_report(&self, report: &NewReport) -> StoreResult<Report> {
        if report.period_start > report.period_end {
            return Err(StoreError::validation("period start must not be after period end"));
        }
        let row = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (pool_id, author_id, report_type, period_start, period_end, formed_at, body)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.pool_id)
        .bind(report.author_id)
        .bind(report.kind)
        .bind(report.period_start)
        .bind(report.period_end)
        .bind(report.formed_at)
        .bind(&report.body)
        .fetch_one(&self.pool)
        .await?;

        info!(
            report_id = row.id,
            pool_id = row.pool_id,
            kind = ?row.report_type,
            "Report stored"
        );
        Ok(row)
    }

    pub async fn get_report_by_id(&self, id: i64) -> StoreResult<Report> {
        sqlx::query_as::<_, Report>(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("report", id))
    }

    /// Reports whose period overlaps `[start, end]`, optionally of one kind,
    /// most recently formed first.
    pub async fn get_reports_data(
        &self,
        kind: Option<ReportKind>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<ReportSummary>> {
        if start > end {
            return Err(StoreError::validation("period start must not be after period end"));
        }
        let rows = sqlx::query_as::<_, ReportSummary>(
            r#"
            SELECT r.id, r.report_type, r.pool_id, p.name AS pool_name,
                   r.period_start, r.period_end,
                   u.first_name AS author_first_name, u.last_name AS author_last_name,
                   r.formed_at, r.body
            FROM reports r
            LEFT JOIN pools p ON p.id = r.pool_id
            LEFT JOIN users u ON u.id = r.author_id
            WHERE r.period_start <= ?2 AND r.period_end >= ?1
              AND (?3 IS NULL OR r.report_type = ?3)
            ORDER BY r.formed_at DESC, r.id DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct kinds that have at least one stored report.
    pub async fn get_all_report_types(&self) -> StoreResult<Vec<ReportKind>> {
        let rows: Vec<(ReportKind,)> =
            sqlx::query_as("SELECT DISTINCT report_type FROM reports ORDER BY report_type")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(k,)| k).collect())
    }

    pub async fn delete_report(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("report", id));
        }
        info!(report_id = id, "Report deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::models::{PoolInput, PoolStatus};

    async fn seed(store: &Store) -> (i64, i64) {
        store.seed_admin("admin", "admin").await.unwrap();
        let author = store.get_all_users().await.unwrap()[0].id;
        let pool = store
            .add_pool(&PoolInput {
                name: "Pool-A".into(),
                volume: 50.0,
                species: "Trout".into(),
                fish_count: 5000,
                stocked_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                status: PoolStatus::Active,
            })
            .await
            .unwrap()
            .id;
        (pool, author)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn report(pool_id: i64, author_id: i64, kind: ReportKind, from: u32, to: u32) -> NewReport {
        NewReport {
            pool_id,
            author_id,
            kind,
            period_start: day(from),
            period_end: day(to),
            formed_at: Utc::now(),
            body: "Notes".into(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stored_report_is_listed_with_names(pool: SqlitePool) {
        let store = Store::new(pool).with_password_cost(crate::auth::MIN_COST);
        let (p, a) = seed(&store).await;
        let stored = store
            .add_report(&report(p, a, ReportKind::DailyMonitoring, 1, 1))
            .await
            .unwrap();

        assert_eq!(store.get_report_by_id(stored.id).await.unwrap(), stored);

        let list = store.get_reports_data(None, day(1), day(31)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].pool_name.as_deref(), Some("Pool-A"));
        assert_eq!(list[0].author_name().as_deref(), Some("System Administrator"));
        assert!(list[0].is_filled());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn listing_uses_period_overlap_and_kind(pool: SqlitePool) {
        let store = Store::new(pool).with_password_cost(crate::auth::MIN_COST);
        let (p, a) = seed(&store).await;
        store.add_report(&report(p, a, ReportKind::DailyMonitoring, 1, 3)).await.unwrap();
        store.add_report(&report(p, a, ReportKind::FeedingAnalysis, 5, 10)).await.unwrap();
        store.add_report(&report(p, a, ReportKind::FeedingAnalysis, 20, 25)).await.unwrap();

        assert_eq!(store.get_reports_data(None, day(3), day(6)).await.unwrap().len(), 2);
        let feeding = store
            .get_reports_data(Some(ReportKind::FeedingAnalysis), day(1), day(31))
            .await
            .unwrap();
        assert_eq!(feeding.len(), 2);

        let kinds = store.get_all_report_types().await.unwrap();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&ReportKind::DailyMonitoring));
        assert!(kinds.contains(&ReportKind::FeedingAnalysis));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn inverted_period_is_rejected(pool: SqlitePool) {
        let store = Store::new(pool).with_password_cost(crate::auth::MIN_COST);
        let (p, a) = seed(&store).await;
        let err = store
            .add_report(&report(p, a, ReportKind::Technological, 9, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn report_blocks_pool_deletion_until_removed(pool: SqlitePool) {
        let store = Store::new(pool).with_password_cost(crate::auth::MIN_COST);
        let (p, a) = seed(&store).await;
        let r = store.add_report(&report(p, a, ReportKind::EquipmentStatus, 1, 2)).await.unwrap();

        assert!(matches!(
            store.delete_pool(p).await,
            Err(StoreError::ConstraintViolation(_))
        ));
        store.delete_report(r.id).await.unwrap();
        store.delete_pool(p).await.unwrap();
        assert!(matches!(
            store.delete_report(r.id).await,
            Err(StoreError::NotFound { entity: "report", .. })
        ));
    }
}
