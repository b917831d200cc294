// 📋 Source Specialty - One vendor's specialty row as ingested
//
// Identity is (normalize(name), vendor). The record is immutable once
// ingested; the engine only moves it between the unmapped pool and groups.

use crate::normalize::{normalize, normalize_vendor};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Total cash compensation
    Tcc,

    /// Work RVUs
    Wrvu,

    /// Conversion factor (dollars per wRVU)
    Cf,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Tcc, Metric::Wrvu, Metric::Cf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Tcc => "tcc",
            Metric::Wrvu => "wrvu",
            Metric::Cf => "cf",
        }
    }

    pub fn parse(s: &str) -> Option<Metric> {
        match s.trim().to_lowercase().as_str() {
            "tcc" => Some(Metric::Tcc),
            "wrvu" | "wrvus" => Some(Metric::Wrvu),
            "cf" => Some(Metric::Cf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Percentile {
    P25,
    P50,
    P75,
    P90,
}

impl Percentile {
    pub const ALL: [Percentile; 4] = [Percentile::P25, Percentile::P50, Percentile::P75, Percentile::P90];

    pub fn rank(&self) -> u8 {
        match self {
            Percentile::P25 => 25,
            Percentile::P50 => 50,
            Percentile::P75 => 75,
            Percentile::P90 => 90,
        }
    }
}

/// Published breakpoints for one metric; `None` when the vendor omitted a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileValues {
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
}

impl PercentileValues {
    pub fn new(p25: f64, p50: f64, p75: f64, p90: f64) -> Self {
        PercentileValues {
            p25: Some(p25),
            p50: Some(p50),
            p75: Some(p75),
            p90: Some(p90),
        }
    }

    pub fn get(&self, percentile: Percentile) -> Option<f64> {
        match percentile {
            Percentile::P25 => self.p25,
            Percentile::P50 => self.p50,
            Percentile::P75 => self.p75,
            Percentile::P90 => self.p90,
        }
    }

    pub fn is_empty(&self) -> bool {
        Percentile::ALL.iter().all(|p| self.get(*p).is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyMetrics {
    pub tcc: Option<PercentileValues>,
    pub wrvu: Option<PercentileValues>,
    pub cf: Option<PercentileValues>,
}

impl SurveyMetrics {
    pub fn get(&self, metric: Metric) -> Option<&PercentileValues> {
        match metric {
            Metric::Tcc => self.tcc.as_ref(),
            Metric::Wrvu => self.wrvu.as_ref(),
            Metric::Cf => self.cf.as_ref(),
        }
    }

    /// Value of one (metric, percentile) cell, if reported
    pub fn value(&self, metric: Metric, percentile: Percentile) -> Option<f64> {
        self.get(metric).and_then(|values| values.get(percentile))
    }
}

// ============================================================================
// IDENTITY
// ============================================================================

/// Identity of a source specialty: normalized name + normalized vendor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpecialtyKey {
    pub name: String,
    pub vendor: String,
}

impl SpecialtyKey {
    pub fn new(name: &str, vendor: &str) -> Self {
        SpecialtyKey {
            name: normalize(name),
            vendor: normalize_vendor(vendor),
        }
    }
}

impl fmt::Display for SpecialtyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.vendor)
    }
}

// ============================================================================
// SOURCE SPECIALTY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpecialty {
    /// Specialty label exactly as the vendor published it
    pub name: String,

    /// Survey vendor (e.g., "MGMA", "SullivanCotter")
    pub vendor: String,

    #[serde(default)]
    pub metrics: SurveyMetrics,

    /// Number of source rows behind this record
    #[serde(default)]
    pub record_count: u32,
}

impl SourceSpecialty {
    pub fn new(name: &str, vendor: &str) -> Self {
        SourceSpecialty {
            name: name.trim().to_string(),
            vendor: vendor.trim().to_string(),
            metrics: SurveyMetrics::default(),
            record_count: 1,
        }
    }

    pub fn with_metrics(name: &str, vendor: &str, metrics: SurveyMetrics, record_count: u32) -> Self {
        let mut source = Self::new(name, vendor);
        source.metrics = metrics;
        source.record_count = record_count;
        source
    }

    pub fn key(&self) -> SpecialtyKey {
        SpecialtyKey::new(&self.name, &self.vendor)
    }

    pub fn same_vendor(&self, other: &SourceSpecialty) -> bool {
        normalize_vendor(&self.vendor) == normalize_vendor(&other.vendor)
    }
}
