use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::auth;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file; parent directories are created on demand.
    pub database_path: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    /// Refresh interval of the latest-readings cache, in seconds.
    pub monitor_interval_secs: u64,
    /// Directory for generated workbooks.
    pub export_dir: PathBuf,
    /// Administrator account seeded on first start.
    pub admin_username: String,
    pub admin_password: String,
    pub password_hash_cost: u32,
    /// Sessions unused for this long are closed.
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; every key has a default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let password_hash_cost: u32 =
            optional("PASSWORD_HASH_COST", &bcrypt::DEFAULT_COST.to_string())
                .parse()
                .context("PASSWORD_HASH_COST must be an integer")?;
        if !(auth::MIN_COST..=auth::MAX_COST).contains(&password_hash_cost) {
            bail!(
                "PASSWORD_HASH_COST must be between {} and {}",
                auth::MIN_COST,
                auth::MAX_COST
            );
        }

        let monitor_interval_secs: u64 = optional("MONITOR_INTERVAL_SECS", "30")
            .parse()
            .context("MONITOR_INTERVAL_SECS must be a positive integer")?;
        if monitor_interval_secs == 0 {
            bail!("MONITOR_INTERVAL_SECS must be a positive integer");
        }

        let session_idle_secs: u64 = optional("SESSION_IDLE_SECS", "3600")
            .parse()
            .context("SESSION_IDLE_SECS must be a positive integer")?;
        if session_idle_secs == 0 {
            bail!("SESSION_IDLE_SECS must be a positive integer");
        }

        Ok(Self {
            database_path: optional("DATABASE_PATH", "data/fishhub.db").into(),
            server_host: optional("SERVER_HOST", "127.0.0.1"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            monitor_interval_secs,
            export_dir: optional("EXPORT_DIR", ".").into(),
            admin_username: optional("ADMIN_USERNAME", "admin"),
            admin_password: optional("ADMIN_PASSWORD", "admin"),
            password_hash_cost,
            session_idle_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = config_from(&[]).unwrap();
        assert_eq!(c.database_path, PathBuf::from("data/fishhub.db"));
        assert_eq!(c.server_host, "127.0.0.1");
        assert_eq!(c.server_port, 8080);
        assert_eq!(c.monitor_interval_secs, 30);
        assert_eq!(c.export_dir, PathBuf::from("."));
        assert_eq!(c.admin_username, "admin");
        assert_eq!(c.password_hash_cost, bcrypt::DEFAULT_COST);
        assert_eq!(c.session_idle_secs, 3600);
    }

    #[test]
    fn values_override_defaults() {
        let c = config_from(&[
            ("DATABASE_PATH", "/tmp/farm.db"),
            ("SERVER_PORT", "9000"),
            ("MONITOR_INTERVAL_SECS", "5"),
            ("PASSWORD_HASH_COST", "4"),
        ])
        .unwrap();
        assert_eq!(c.database_path, PathBuf::from("/tmp/farm.db"));
        assert_eq!(c.server_port, 9000);
        assert_eq!(c.monitor_interval_secs, 5);
        assert_eq!(c.password_hash_cost, 4);
    }

    #[test]
    fn invalid_port_errors() {
        let err = config_from(&[("SERVER_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn cost_out_of_range_errors() {
        let err = config_from(&[("PASSWORD_HASH_COST", "3")]).unwrap_err();
        assert!(err.to_string().contains("between 4 and 31"));
    }

    #[test]
    fn zero_interval_errors() {
        assert!(config_from(&[("MONITOR_INTERVAL_SECS", "0")]).is_err());
        assert!(config_from(&[("SESSION_IDLE_SECS", "0")]).is_err());
    }
}
