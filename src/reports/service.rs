use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use super::body::{self, BodyParts, Collected};
use crate::db::{
    models::{AuthenticatedUser, NewReport, Pool, Report, ReportKind},
    Store, StoreError,
};

/// What an author asks for when forming a report.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub pool_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Author's own text, appended after the collected data. Required.
    pub notes: String,
}

#[derive(Clone)]
pub struct ReportService {
    store: Store,
}

impl ReportService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Collect the data for `request.kind`, render the body and store it.
    pub async fn generate(
        &self,
        author: &AuthenticatedUser,
        request: &ReportRequest,
    ) -> Result<Report> {
        if request.notes.trim().is_empty() {
            return Err(StoreError::validation("report notes are required").into());
        }
        if request.period_start > request.period_end {
            return Err(StoreError::validation("period start must not be after period end").into());
        }

        let pool = self.store.get_pool_by_id(request.pool_id).await?;
        let collected = self.collect(request, &pool).await?;
        let formed_at = Utc::now();

        let text = body::render(&BodyParts {
            kind: request.kind,
            pool: &pool,
            period_start: request.period_start,
            period_end: request.period_end,
            formed_at,
            collected: &collected,
            notes: &request.notes,
        });

        let report = self
            .store
            .add_report(&NewReport {
                pool_id: pool.id,
                author_id: author.id,
                kind: request.kind,
                period_start: request.period_start,
                period_end: request.period_end,
                formed_at,
                body: text,
            })
            .await?;

        info!(report_id = report.id, author_id = author.id, "Report generated");
        Ok(report)
    }

    async fn collect(&self, request: &ReportRequest, pool: &Pool) -> Result<Collected> {
        let (start, end, pool_id) = (request.period_start, request.period_end, Some(pool.id));
        let collected = match request.kind {
            ReportKind::DailyMonitoring => {
                let mut rows = self
                    .store
                    .get_monitoring_data_for_period(start, end, pool_id)
                    .await?;
                rows.truncate(body::MONITORING_LINES);
                Collected::Monitoring(rows)
            }
            ReportKind::FeedingAnalysis => Collected::Feeding(
                self.store.get_feeding_data_for_period(start, end, pool_id).await?,
            ),
            ReportKind::GrowthStatistics => Collected::Growth(
                self.store.get_growth_data_for_period(start, end, pool_id).await?,
            ),
            ReportKind::EquipmentStatus => {
                Collected::Equipment(self.store.get_sensors_by_pool(pool.id).await?)
            }
            ReportKind::Technological => Collected::Nothing,
        };
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::SqlitePool;

    use super::*;
    use crate::{
        auth::MIN_COST,
        db::models::{FeedingInput, FeedingMethod, PoolInput, PoolStatus},
    };

    async fn setup(pool: SqlitePool) -> (Store, AuthenticatedUser, i64) {
        let store = Store::new(pool).with_password_cost(MIN_COST);
        store.seed_admin("admin", "admin").await.unwrap();
        let author = store.check_user("admin", "admin").await.unwrap().unwrap();
        let pool_id = store
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
        (store, author, pool_id)
    }

    fn request(kind: ReportKind, pool_id: i64, notes: &str) -> ReportRequest {
        ReportRequest {
            kind,
            pool_id,
            period_start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            notes: notes.into(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn feeding_report_collects_period_feedings(pool: SqlitePool) {
        let (store, author, pool_id) = setup(pool).await;
        for (d, kg) in [(2, 1.5), (3, 2.0), (20, 9.0)] {
            store
                .add_feeding(&FeedingInput {
                    pool_id,
                    feed_type: "Grower".into(),
                    amount_kg: kg,
                    fed_at: Some(Utc.with_ymd_and_hms(2024, 5, d, 9, 0, 0).unwrap()),
                    method: FeedingMethod::Automatic,
                })
                .await
                .unwrap();
        }

        let service = ReportService::new(store.clone());
        let report = service
            .generate(&author, &request(ReportKind::FeedingAnalysis, pool_id, "Appetite good"))
            .await
            .unwrap();

        assert_eq!(report.author_id, author.id);
        assert_eq!(report.report_type, ReportKind::FeedingAnalysis);
        assert!(report.body.contains("Total feed used: 3.50 kg"));
        assert!(report.body.ends_with("Appetite good"));
        assert_eq!(store.get_report_by_id(report.id).await.unwrap(), report);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn blank_notes_are_rejected_before_storing(pool: SqlitePool) {
        let (store, author, pool_id) = setup(pool).await;
        let service = ReportService::new(store.clone());

        let err = service
            .generate(&author, &request(ReportKind::Technological, pool_id, "   "))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Validation(_))
        ));
        assert!(store.get_all_report_types().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_pool_is_not_found(pool: SqlitePool) {
        let (store, author, _) = setup(pool).await;
        let service = ReportService::new(store);
        let err = service
            .generate(&author, &request(ReportKind::DailyMonitoring, 99, "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { entity: "pool", .. })
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn monitoring_report_without_data_says_so(pool: SqlitePool) {
        let (store, author, pool_id) = setup(pool).await;
        let service = ReportService::new(store);
        let report = service
            .generate(&author, &request(ReportKind::DailyMonitoring, pool_id, "Quiet week"))
            .await
            .unwrap();
        assert!(report.body.contains("No monitoring data for the period"));
    }
}
