// ⚙️ Engine Configuration - Thresholds and limits as data
//
// The similarity tiers encode existing behavioral contracts, so the defaults
// below must not drift. They live here so they can be tuned per deployment
// without touching the scorer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// SIMILARITY THRESHOLDS
// ============================================================================

/// Confidence assigned by each similarity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    /// Tier 1: identical normalized names
    pub exact_match: f64,

    /// Tier 2: one name is a synonym of the other's canonical specialty
    pub direct_synonym: f64,

    /// Tier 3: the two canonical specialties share a synonym
    pub shared_synonym: f64,

    /// Tier 4 upper bound: proper substring containment
    pub substring_ceiling: f64,

    /// Tier 4 lower bound
    pub substring_floor: f64,

    /// Tier 5: both names resolve into the same category
    pub same_category: f64,

    /// Tier 6: token overlap never scores above this
    pub token_overlap_cap: f64,

    /// Tier 6: multiplicative penalty per out-of-order shared token pair
    pub order_penalty: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        SimilarityThresholds {
            exact_match: 1.0,
            direct_synonym: 0.95,
            shared_synonym: 0.90,
            substring_ceiling: 0.8,
            substring_floor: 0.7,
            same_category: 0.85,
            token_overlap_cap: 0.7,
            order_penalty: 0.10,
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: SimilarityThresholds,

    /// Minimum confidence for interactive suggestions (default: 0.6)
    pub suggest_threshold: f64,

    /// Minimum confidence for cross-vendor bulk search (default: 0.5)
    pub bulk_threshold: f64,

    /// Auto-arrange commits candidates at or above this (default: 0.9)
    pub auto_accept_threshold: f64,

    /// Synonym length bounds, measured on the normalized form
    pub synonym_min_len: usize,
    pub synonym_max_len: usize,

    /// Normalized words that can never become a synonym or specialty name
    pub reserved_words: Vec<String>,

    /// Synonym history entries kept before the oldest are evicted
    pub history_limit: usize,

    /// Operation log entries kept before the oldest are evicted
    pub operations_limit: usize,

    /// Auto-arrange turns specialties without a counterpart into single-source groups
    pub auto_single_source: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            thresholds: SimilarityThresholds::default(),
            suggest_threshold: 0.6,
            bulk_threshold: 0.5,
            auto_accept_threshold: 0.9,
            synonym_min_len: 2,
            synonym_max_len: 100,
            reserved_words: ["unknown", "other", "misc", "various"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            history_limit: 1000,
            operations_limit: 1000,
            auto_single_source: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EngineConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    pub fn is_reserved(&self, normalized: &str) -> bool {
        self.reserved_words.iter().any(|w| w == normalized)
    }
}
