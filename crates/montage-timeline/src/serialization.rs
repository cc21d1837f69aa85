//! Layout persistence with versioning and migration.
//!
//! Uses JSON with a schema version field for forward-compatible persistence.

use montage_core::{MontageError, Result};
use serde::{Deserialize, Serialize};

use crate::layout::Timeline;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned layout file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutFile {
    /// Schema version for migration.
    pub version: u32,
    /// The timeline data.
    pub timeline: Timeline,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl LayoutFile {
    /// Create a new layout file from a timeline snapshot.
    pub fn new(timeline: Timeline) -> Self {
        Self {
            version: CURRENT_VERSION,
            timeline,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| MontageError::Serialization(format!("Failed to serialize layout: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        // First, try to read just the version
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| MontageError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        if version > CURRENT_VERSION {
            return Err(MontageError::Serialization(format!(
                "Layout file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;

        serde_json::from_value(migrated)
            .map_err(|e| MontageError::Serialization(format!("Failed to parse layout: {}", e)))
    }

    /// Save layout to a file path.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load layout from a file path.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 -> v1: bare timeline without the versioned wrapper
                if data.get("version").is_none() {
                    data = serde_json::json!({
                        "version": 1,
                        "timeline": data,
                        "app_version": "0.1.0",
                    });
                }
                version = 1;
            }
            _ => {
                return Err(MontageError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
