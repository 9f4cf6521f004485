pub mod service;

pub use service::{record_reading, rejoin_pool, rejoin_sensor, MonitoringService};
