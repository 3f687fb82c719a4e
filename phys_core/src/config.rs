//! # Solver Settings
//!
//! Knobs that change how known values are read and how results are reported.
//! Settings are plain JSON on disk; any field left out takes its default.
//!
//! ```json
//! { "bare_numbers": "Reject", "force_conventional_units": true }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use phys_core::config::{BareNumberPolicy, SolverSettings};
//!
//! let strict = SolverSettings {
//!     bare_numbers: BareNumberPolicy::Reject,
//!     ..SolverSettings::default()
//! };
//! assert!(strict.force_conventional_units);
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PhysError, PhysResult};

/// How to read a known value given without a unit (`"5"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BareNumberPolicy {
    /// Attach the variable's canonical unit (`r` → ohm); dimensionless when
    /// the variable has none
    #[default]
    CanonicalUnit,
    /// Treat it as a pure number
    Dimensionless,
    /// Refuse it: every known value must name its unit
    Reject,
}

/// Settings shared by the variable store and the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub bare_numbers: BareNumberPolicy,

    /// Report results in the conventional unit of the unknown's name
    /// (`f` → newton) instead of the automatically compacted unit
    pub force_conventional_units: bool,

    /// Read a standalone `e` in an equation as Euler's number rather than
    /// the energy variable
    pub reserve_euler: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            bare_numbers: BareNumberPolicy::CanonicalUnit,
            force_conventional_units: true,
            reserve_euler: false,
        }
    }
}

/// Load settings from a JSON file.
pub fn load_settings(path: &Path) -> PhysResult<SolverSettings> {
    let contents = fs::read_to_string(path)
        .map_err(|e| PhysError::file_error("read", path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| PhysError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Save settings as pretty JSON.
///
/// Writes to a `.tmp` sibling first and renames it over the target, so a
/// crash never leaves a half-written file behind.
pub fn save_settings(settings: &SolverSettings, path: &Path) -> PhysResult<()> {
    let json = serde_json::to_string_pretty(settings).map_err(|e| PhysError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        PhysError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        PhysError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        PhysError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PhysError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_settings_path(name: &str) -> std::path::PathBuf {
        temp_dir().join(format!("phys_core_test_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let settings = SolverSettings::default();
        assert_eq!(settings.bare_numbers, BareNumberPolicy::CanonicalUnit);
        assert!(settings.force_conventional_units);
        assert!(!settings.reserve_euler);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: SolverSettings = serde_json::from_str(r#"{"bare_numbers":"Reject"}"#).unwrap();
        assert_eq!(settings.bare_numbers, BareNumberPolicy::Reject);
        assert!(settings.force_conventional_units);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_settings_path("roundtrip");
        let settings = SolverSettings {
            bare_numbers: BareNumberPolicy::Dimensionless,
            force_conventional_units: false,
            reserve_euler: true,
        };
        save_settings(&settings, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_errors() {
        let missing = load_settings(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");

        let path = temp_settings_path("garbage");
        fs::write(&path, "not json").unwrap();
        let garbage = load_settings(&path).unwrap_err();
        assert_eq!(garbage.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }
}
