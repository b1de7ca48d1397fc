//! Content fingerprints for reproducibility checks.
//!
//! A change-point report carries the BLAKE3 hash of the inputs it was computed
//! from and of the detector settings, so two reports can be compared without
//! diffing their contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detector::DetectorConfig;
use crate::events::EventCatalog;
use crate::series::SeriesStore;

/// Hash of the loaded price series and event catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of every detector setting that affects output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn dataset_hash(series: &SeriesStore, catalog: &EventCatalog) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(series.len() as u64).to_le_bytes());
    for p in series.points() {
        hasher.update(p.date.to_string().as_bytes());
        hasher.update(&p.price.to_bits().to_le_bytes());
    }
    hasher.update(&(catalog.len() as u64).to_le_bytes());
    for e in catalog.events() {
        hasher.update(&e.id.to_le_bytes());
        hasher.update(e.date.to_string().as_bytes());
        hasher.update(e.event_type.as_str().as_bytes());
        hasher.update(e.expected_impact.as_str().as_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

/// `parallel` is excluded: it changes scheduling, not results.
pub fn config_hash(config: &DetectorConfig) -> ConfigHash {
    let mut hasher = blake3::Hasher::new();
    for n in [config.trailing_window, config.leading_window, config.min_separation] {
        hasher.update(&(n as u64).to_le_bytes());
    }
    for x in [
        config.min_confidence,
        config.expected_segment_length,
        config.volatility_ratio_threshold,
        config.mean_shift_threshold,
        config.winsor_mads,
    ] {
        hasher.update(&x.to_bits().to_le_bytes());
    }
    ConfigHash(hasher.finalize().to_hex().to_string())
}
