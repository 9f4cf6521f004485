use std::time::Duration;

use anyhow::Result;
use tokio::time;
use tracing::{debug, error, info};

use crate::{
    db::{
        models::{MonitoringReading, NewReading},
        Store,
    },
    reading_cache::ReadingCache,
};

/// Keeps the latest-readings cache in step with the database.
pub struct MonitoringService {
    store: Store,
    cache: ReadingCache,
    interval: Duration,
}

impl MonitoringService {
    pub fn new(store: Store, cache: ReadingCache, interval_secs: u64) -> Self {
        Self {
            store,
            cache,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Runs the refresh loop indefinitely.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Monitoring loop started");
        let mut ticker = time::interval(self.interval);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_once().await {
                error!(error = %e, "Monitoring refresh failed");
            }
        }
    }

    /// Reload the latest reading of every sensor into the cache.
    pub async fn refresh_once(&self) -> Result<usize> {
        let latest = self.store.get_latest_reading_per_sensor().await?;
        let count = latest.len();
        self.cache.replace_all(latest).await;
        debug!(sensors = count, "Latest readings cache refreshed");
        Ok(count)
    }
}

/// Persist a reading and publish it to the cache straight away.
pub async fn record_reading(
    store: &Store,
    cache: &ReadingCache,
    sensor_id: i64,
    reading: &NewReading,
) -> Result<MonitoringReading> {
    let stored = store.add_sensor_reading(sensor_id, reading).await?;
    let joined = store.get_monitoring_reading(stored.id).await?;
    cache.update(joined.clone()).await;
    Ok(joined)
}

/// Re-read the cached reading of `sensor_id` so its pool columns follow a
/// sensor edit.
pub async fn rejoin_sensor(store: &Store, cache: &ReadingCache, sensor_id: i64) -> Result<()> {
    if let Some(cached) = cache.get(sensor_id).await {
        let fresh = store.get_monitoring_reading(cached.id).await?;
        cache.update(fresh).await;
    }
    Ok(())
}

/// Same as [`rejoin_sensor`] for every cached sensor of `pool_id`.
pub async fn rejoin_pool(store: &Store, cache: &ReadingCache, pool_id: i64) -> Result<()> {
    for cached in cache.for_pool(pool_id).await {
        rejoin_sensor(store, cache, cached.sensor_id).await?;
    }
    Ok(())
}
