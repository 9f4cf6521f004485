pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod export;
pub mod monitoring;
pub mod reading_cache;
pub mod reports;
pub mod sessions;
