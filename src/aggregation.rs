// 📊 Metrics Aggregation - Canonical market data for a mapping group
//
// Per (metric, percentile) cell: mean of the member values that are present
// and > 0. A member missing one cell is excluded from that cell only.

use crate::entities::{MappingGroup, Metric, Percentile, PercentileValues};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// CELLS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCell {
    /// Mean of contributing values; `None` when no member reported the cell
    pub value: Option<f64>,

    /// Number of members that contributed
    pub sources: usize,
}

impl AggregatedCell {
    /// Average the usable values (present, finite, > 0)
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let usable: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();

        if usable.is_empty() {
            return AggregatedCell::default();
        }

        AggregatedCell {
            value: Some(usable.iter().sum::<f64>() / usable.len() as f64),
            sources: usable.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPercentiles {
    pub p25: AggregatedCell,
    pub p50: AggregatedCell,
    pub p75: AggregatedCell,
    pub p90: AggregatedCell,
}

impl AggregatedPercentiles {
    pub fn get(&self, percentile: Percentile) -> &AggregatedCell {
        match percentile {
            Percentile::P25 => &self.p25,
            Percentile::P50 => &self.p50,
            Percentile::P75 => &self.p75,
            Percentile::P90 => &self.p90,
        }
    }

    fn get_mut(&mut self, percentile: Percentile) -> &mut AggregatedCell {
        match percentile {
            Percentile::P25 => &mut self.p25,
            Percentile::P50 => &mut self.p50,
            Percentile::P75 => &mut self.p75,
            Percentile::P90 => &mut self.p90,
        }
    }

    /// Breakpoints for lookup; fails on the first unreported cell
    pub fn breakpoints(&self, metric: Metric) -> EngineResult<Breakpoints> {
        let value = |p: Percentile| {
            self.get(p).value.ok_or_else(|| EngineError::MissingBreakpoint {
                metric: metric.as_str().to_string(),
                percentile: p.rank(),
            })
        };

        Ok(Breakpoints {
            p25: value(Percentile::P25)?,
            p50: value(Percentile::P50)?,
            p75: value(Percentile::P75)?,
            p90: value(Percentile::P90)?,
        })
    }

    /// Plain values, dropping source counts
    pub fn values(&self) -> PercentileValues {
        PercentileValues {
            p25: self.p25.value,
            p50: self.p50.value,
            p75: self.p75.value,
            p90: self.p90.value,
        }
    }
}

// ============================================================================
// CANONICAL MARKET DATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMarketData {
    pub group_id: String,
    pub name: String,
    pub vendors: Vec<String>,

    /// Total respondent rows across members
    pub record_count: u64,

    pub tcc: AggregatedPercentiles,
    pub wrvu: AggregatedPercentiles,
    pub cf: AggregatedPercentiles,
}

impl CanonicalMarketData {
    pub fn metric(&self, metric: Metric) -> &AggregatedPercentiles {
        match metric {
            Metric::Tcc => &self.tcc,
            Metric::Wrvu => &self.wrvu,
            Metric::Cf => &self.cf,
        }
    }

    fn metric_mut(&mut self, metric: Metric) -> &mut AggregatedPercentiles {
        match metric {
            Metric::Tcc => &mut self.tcc,
            Metric::Wrvu => &mut self.wrvu,
            Metric::Cf => &mut self.cf,
        }
    }

    /// Rank `value` against this record's breakpoints for `metric`
    pub fn percentile_rank(&self, metric: Metric, value: f64) -> EngineResult<f64> {
        let breakpoints = self.metric(metric).breakpoints(metric)?;
        percentile_lookup(&breakpoints, value)
    }
}

/// Combine a group's member statistics into one canonical record
pub fn aggregate(group: &MappingGroup) -> CanonicalMarketData {
    let mut data = CanonicalMarketData {
        group_id: group.id.clone(),
        name: group.display_name().to_string(),
        vendors: group.vendors(),
        record_count: group.members.iter().map(|m| u64::from(m.record_count)).sum(),
        tcc: AggregatedPercentiles::default(),
        wrvu: AggregatedPercentiles::default(),
        cf: AggregatedPercentiles::default(),
    };

    for metric in Metric::ALL {
        for percentile in Percentile::ALL {
            let cell = AggregatedCell::from_values(group.members.iter().map(|m| m.metrics.value(metric, percentile)));
            *data.metric_mut(metric).get_mut(percentile) = cell;
        }
    }

    data
}

// ============================================================================
// PERCENTILE LOOKUP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Breakpoints {
    pub fn new(p25: f64, p50: f64, p75: f64, p90: f64) -> Self {
        Breakpoints { p25, p50, p75, p90 }
    }

    fn validate(&self) -> EngineResult<()> {
        for (percentile, value) in [(25, self.p25), (50, self.p50), (75, self.p75), (90, self.p90)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidBreakpoint { percentile, value });
            }
        }
        Ok(())
    }
}

/// Interpolated percentile of `value`, clamped to [0, 100]
///
/// ```text
/// v ≤ p25        → (v/p25)·25
/// p25 < v ≤ p50  → 25 + (v-p25)/(p50-p25)·25
/// p50 < v ≤ p75  → 50 + (v-p50)/(p75-p50)·25
/// p75 < v ≤ p90  → 75 + (v-p75)/(p90-p75)·15
/// v > p90        → 90 + (v-p90)/p90·10
/// ```
pub fn percentile_lookup(breakpoints: &Breakpoints, value: f64) -> EngineResult<f64> {
    breakpoints.validate()?;
    if value.is_nan() {
        return Err(EngineError::InvalidValue(value));
    }

    let Breakpoints { p25, p50, p75, p90 } = *breakpoints;

    let pct = if value <= p25 {
        (value / p25) * 25.0
    } else if value <= p50 {
        25.0 + (value - p25) / (p50 - p25) * 25.0
    } else if value <= p75 {
        50.0 + (value - p50) / (p75 - p50) * 25.0
    } else if value <= p90 {
        75.0 + (value - p75) / (p90 - p75) * 15.0
    } else {
        90.0 + (value - p90) / p90 * 10.0
    };

    Ok(pct.clamp(0.0, 100.0))
}

// ============================================================================
// TESTS
// ============================================================================
