//! Manual calibration offset and its persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CalibrationError;

/// Default calibration file, relative to the working directory.
pub const DEFAULT_CALIBRATION_FILE: &str = "superrich_calibration.json";

/// Decimal places kept for a stored offset.
const OFFSET_PRECISION: u32 = 6;

/// A human-observed correction to the automatically fetched rate.
///
/// Rates are written as JSON numbers; string values are still accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    /// `manual_observed_rate - reference_base_rate`.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub offset: Decimal,
    /// Uncalibrated rate fetched at calibration time.
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub reference_base_rate: Option<Decimal>,
    /// Rate read off a real exchange counter.
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub manual_observed_rate: Option<Decimal>,
    /// When the calibration was recorded.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalibrationRecord {
    /// Record an observation against the base rate it corrects.
    pub fn new(observed: Decimal, base: Decimal) -> Self {
        Self {
            offset: (observed - base).round_dp(OFFSET_PRECISION),
            reference_base_rate: Some(base),
            manual_observed_rate: Some(observed),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Single-slot store for the calibration record.
///
/// Saving overwrites whatever was stored before.
pub trait CalibrationStore: Send + Sync {
    /// Read the stored record. `Ok(None)` means nothing was ever saved.
    fn load(&self) -> Result<Option<CalibrationRecord>, CalibrationError>;

    /// Replace the stored record.
    fn save(&self, record: &CalibrationRecord) -> Result<(), CalibrationError>;

    /// Offset to apply right now; absence and every failure read as zero.
    fn load_offset(&self) -> Decimal {
        match self.load() {
            Ok(Some(record)) => record.offset,
            Ok(None) => Decimal::ZERO,
            Err(e) => {
                warn!(error = %e, "Calibration unreadable, using zero offset");
                Decimal::ZERO
            }
        }
    }
}

/// Calibration record kept as a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CalibrationStore for JsonFileStore {
    fn load(&self) -> Result<Option<CalibrationRecord>, CalibrationError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No calibration file");
                return Ok(None);
            }
            Err(e) => return Err(CalibrationError::Io(e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CalibrationError::Malformed(e.to_string()))
    }

    fn save(&self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| CalibrationError::Encode(e.to_string()))?;

        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), offset = %record.offset, "Calibration saved");
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    slot: RwLock<Option<CalibrationRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `record`.
    pub fn with_record(record: CalibrationRecord) -> Self {
        Self {
            slot: RwLock::new(Some(record)),
        }
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> Result<Option<CalibrationRecord>, CalibrationError> {
        Ok(self.slot.read().clone())
    }

    fn save(&self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        *self.slot.write() = Some(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_offset_invariant() {
        let record = CalibrationRecord::new(dec!(4.70), dec!(4.50));
        assert_eq!(record.offset, dec!(0.20));
        assert_eq!(record.reference_base_rate, Some(dec!(4.50)));
        assert_eq!(record.manual_observed_rate, Some(dec!(4.70)));
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn test_offset_rounded_to_six_places() {
        let record = CalibrationRecord::new(dec!(4.6), dec!(4.51234567));
        assert_eq!(record.offset, dec!(0.087654));
    }

    #[test]
    fn test_missing_file_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(store.load().unwrap().is_none());
        assert_eq!(store.load_offset(), Decimal::ZERO);
    }

    #[test]
    fn test_malformed_file_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, "{ offset: oops").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.load(), Err(CalibrationError::Malformed(_))));
        assert_eq!(store.load_offset(), Decimal::ZERO);
    }

    #[test]
    fn test_legacy_offset_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, r#"{"offset": 0.15}"#).unwrap();

        let record = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(record.offset, dec!(0.15));
        assert!(record.reference_base_rate.is_none());
    }

    #[test]
    fn test_save_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");

        let record = CalibrationRecord::new(dec!(4.62), dec!(4.4975));
        JsonFileStore::new(&path).save(&record).unwrap();

        let reopened = JsonFileStore::new(&path);
        let loaded = reopened.load().unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(reopened.load_offset(), dec!(0.1225));
        assert!(!dir.path().join("calibration.json.tmp").exists());
    }

    #[test]
    fn test_saved_file_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        JsonFileStore::new(&path)
            .save(&CalibrationRecord::new(dec!(4.70), dec!(4.50)))
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for key in ["offset", "referenceBaseRate", "manualObservedRate", "updatedAt"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_saved_rates_are_json_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        JsonFileStore::new(&path)
            .save(&CalibrationRecord::new(dec!(4.70), dec!(4.50)))
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["offset"].is_number(), "offset written as {}", json["offset"]);
        assert_eq!(json["offset"].as_f64(), Some(0.2));
        assert!(json["referenceBaseRate"].is_number());
        assert!(json["manualObservedRate"].is_number());
    }

    #[test]
    fn test_string_offset_still_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, r#"{"offset": "0.20", "referenceBaseRate": "4.50"}"#).unwrap();

        let record = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(record.offset, dec!(0.20));
        assert_eq!(record.reference_base_rate, Some(dec!(4.50)));
    }

    #[test]
    fn test_save_overwrites() {
        let store = MemoryStore::new();
        store.save(&CalibrationRecord::new(dec!(4.70), dec!(4.50))).unwrap();
        store.save(&CalibrationRecord::new(dec!(4.40), dec!(4.50))).unwrap();

        assert_eq!(store.load_offset(), dec!(-0.10));
    }
}
