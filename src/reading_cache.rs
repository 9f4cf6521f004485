use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::db::models::MonitoringReading;

/// In-memory store of the most recent reading per sensor.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
#[derive(Clone, Default)]
pub struct ReadingCache {
    inner: Arc<RwLock<HashMap<i64, MonitoringReading>>>,
}

impl ReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `reading` unless a newer one is already cached for its sensor.
    pub async fn update(&self, reading: MonitoringReading) {
        let mut map = self.inner.write().await;
        match map.get(&reading.sensor_id) {
            Some(current) if current.recorded_at > reading.recorded_at => {}
            _ => {
                map.insert(reading.sensor_id, reading);
            }
        }
    }

    /// Swap in a database snapshot, dropping sensors that no longer have
    /// readings. A cached reading newer than the snapshot's entry survives.
    pub async fn replace_all(&self, readings: Vec<MonitoringReading>) {
        let mut map = self.inner.write().await;
        let fresh = readings
            .into_iter()
            .map(|r| match map.remove(&r.sensor_id) {
                Some(current) if current.recorded_at > r.recorded_at => (r.sensor_id, current),
                _ => (r.sensor_id, r),
            })
            .collect();
        *map = fresh;
    }

    /// Snapshot ordered by pool, then sensor.
    pub async fn all(&self) -> Vec<MonitoringReading> {
        let mut rows: Vec<_> = self.inner.read().await.values().cloned().collect();
        rows.sort_by_key(|r| (r.pool_id, r.sensor_id));
        rows
    }

    pub async fn for_pool(&self, pool_id: i64) -> Vec<MonitoringReading> {
        let mut rows: Vec<_> = self
            .inner
            .read()
            .await
            .values()
            .filter(|r| r.pool_id == pool_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.sensor_id);
        rows
    }

    pub async fn get(&self, sensor_id: i64) -> Option<MonitoringReading> {
        self.inner.read().await.get(&sensor_id).cloned()
    }

    pub async fn remove(&self, sensor_id: i64) {
        self.inner.write().await.remove(&sensor_id);
    }
}
