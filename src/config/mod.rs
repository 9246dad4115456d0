use crate::core::checkin::LatePolicy;
use crate::core::scanner::ScannerSettings;
use crate::errors::{AppError, AppResult};
use crate::utils::path::resolve_in;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_ms: u64,
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_ms: u64,
    #[serde(default = "default_auto_close_grace")]
    pub auto_close_grace_secs: u64,
    #[serde(default = "default_horizon")]
    pub default_horizon_months: u32,
    /// Unset: late only after the session ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_after_minutes: Option<u32>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_scan_interval() -> u64 {
    500
}
fn default_inactivity_timeout() -> u64 {
    30
}
fn default_duplicate_window() -> u64 {
    2000
}
fn default_auto_close_grace() -> u64 {
    60
}
fn default_horizon() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            scan_interval_ms: default_scan_interval(),
            inactivity_timeout_secs: default_inactivity_timeout(),
            duplicate_window_ms: default_duplicate_window(),
            auto_close_grace_secs: default_auto_close_grace(),
            default_horizon_months: default_horizon(),
            late_after_minutes: None,
        }
    }
}

impl Config {
    /// `~/.rollcall`, or `%APPDATA%\rollcall` on Windows.
    pub fn config_dir() -> PathBuf {
        let base = if cfg!(target_os = "windows") {
            dirs::config_dir()
        } else {
            dirs::home_dir()
        };
        let base = base.unwrap_or_else(|| PathBuf::from("."));

        if cfg!(target_os = "windows") {
            base.join("rollcall")
        } else {
            base.join(".rollcall")
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rollcall.conf")
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rollcall.sqlite")
    }

    /// Defaults when the file does not exist; missing keys take their
    /// default too.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Create the config directory and, unless `skip_file`, write the
    /// config file pointing at `db` (relative names land in the config dir).
    pub fn init_all(db: Option<&str>, skip_file: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let mut cfg = Self::load()?;
        if let Some(name) = db {
            cfg.database = Self::resolve_database(name);
        }

        if !skip_file {
            cfg.save_to(&Self::config_file())?;
        }
        Ok(cfg)
    }

    /// `~` is expanded, bare names live in the config directory.
    pub fn resolve_database(name: &str) -> String {
        resolve_in(&Self::config_dir(), name)
            .to_string_lossy()
            .to_string()
    }

    pub fn scanner_settings(&self) -> ScannerSettings {
        ScannerSettings {
            sample_interval: Duration::from_millis(self.scan_interval_ms),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout_secs),
            duplicate_window: Duration::from_millis(self.duplicate_window_ms),
        }
    }

    pub fn late_policy(&self) -> LatePolicy {
        LatePolicy::from_minutes(self.late_after_minutes)
    }

    pub fn auto_close_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.auto_close_grace_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.scan_interval_ms, 500);
        assert_eq!(cfg.inactivity_timeout_secs, 30);
        assert_eq!(cfg.duplicate_window_ms, 2000);
        assert_eq!(cfg.auto_close_grace_secs, 60);
        assert_eq!(cfg.default_horizon_months, 3);
        assert_eq!(cfg.late_policy(), LatePolicy::UntilEnd);
    }

    #[test]
    fn late_threshold_is_read() {
        let cfg: Config = serde_yaml::from_str("late_after_minutes: 15\n").unwrap();
        assert_eq!(
            cfg.late_policy(),
            LatePolicy::AfterStart(chrono::Duration::minutes(15))
        );
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("rollcall-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rollcall.conf");
        fs::write(&path, "scan_interval_ms: [nope").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
