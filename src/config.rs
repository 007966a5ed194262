//! Inbox configuration.
//!
//! Defaults with optional overrides from `PUSHINBOX_*` environment variables.
//! Values that fail to parse are ignored and the default is kept.

use std::path::PathBuf;

use crate::presence::device::DeviceInfo;

/// Configuration handed to [`crate::inbox::Inbox::open`].
#[derive(Debug, Clone)]
pub struct InboxConfig {
    /// SQLite file holding received messages.
    pub database_path: PathBuf,

    /// File holding this installation's stable device identifier.
    pub device_id_path: PathBuf,

    /// Registry path under which device entries are written.
    pub registry_root: String,

    /// Log level passed to [`crate::init_logger`].
    pub log_level: log::LevelFilter,

    /// Hardware description used for the registry display name.
    pub device: DeviceInfo,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pushinbox.db"),
            device_id_path: PathBuf::from("device_id"),
            registry_root: "devices".to_string(),
            log_level: log::LevelFilter::Info,
            device: DeviceInfo::new("unknown", "unknown"),
        }
    }
}

impl InboxConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("PUSHINBOX_DATABASE_PATH") {
            config.database_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("PUSHINBOX_DEVICE_ID_PATH") {
            config.device_id_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("PUSHINBOX_REGISTRY_ROOT") {
            let trimmed = val.trim_matches('/');
            if !trimmed.is_empty() {
                config.registry_root = trimmed.to_string();
            }
        }

        if let Some(val) = lookup("PUSHINBOX_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                config.log_level = level;
            }
        }

        if let Some(val) = lookup("PUSHINBOX_DEVICE_MANUFACTURER") {
            config.device.manufacturer = val;
        }

        if let Some(val) = lookup("PUSHINBOX_DEVICE_MODEL") {
            config.device.model = val;
        }

        config
    }
}
