//! Device identity.

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use crate::error::StorageError;

/// Hardware description reported to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
}

impl DeviceInfo {
    pub fn new(manufacturer: &str, model: &str) -> Self {
        Self {
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
        }
    }

    /// Name shown for this device in the registry.
    ///
    /// Models that already carry the manufacturer name are used as-is,
    /// otherwise the upper-cased manufacturer is prefixed.
    ///
    /// # Examples
    /// ```
    /// use pushinbox_core::presence::DeviceInfo;
    /// assert_eq!(DeviceInfo::new("Google", "Pixel 8").display_name(), "GOOGLE Pixel 8");
    /// assert_eq!(DeviceInfo::new("samsung", "Samsung S24").display_name(), "Samsung S24");
    /// ```
    pub fn display_name(&self) -> String {
        if self
            .model
            .to_lowercase()
            .starts_with(&self.manufacturer.to_lowercase())
        {
            self.model.clone()
        } else {
            format!("{} {}", self.manufacturer.to_uppercase(), self.model)
        }
    }
}

/// Stable random identifier of this installation, used as registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Read the id stored at `path`, creating and storing a new one when the
    /// file is missing or blank.
    pub fn load_or_create(path: &Path) -> Result<Self, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(existing) if !existing.trim().is_empty() => {
                return Ok(Self(existing.trim().to_string()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let id = Uuid::new_v4().to_string();
        std::fs::write(path, &id)?;
        log::info!("DEVICE_ID_CREATED device={} path={}", id, path.display());
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
