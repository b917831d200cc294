// 🔍 Candidate Matcher - Ranked cross-vendor candidates for one specialty
//
// Pure over a snapshot of the unmapped pool: no side effects, so independent
// source specialties can be matched in parallel.

use crate::config::EngineConfig;
use crate::entities::{SourceSpecialty, SpecialtyKey};
use crate::similarity::{MatchTier, SimilarityScorer};
use crate::synonyms::SynonymRegistry;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ============================================================================
// MAPPING CANDIDATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Approved,
    Rejected,
}

impl CandidateStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CandidateStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCandidate {
    /// The specialty suggestions were generated for
    pub source: SpecialtyKey,

    /// Suggested counterpart from another vendor
    pub target: SourceSpecialty,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// Which similarity tier produced the score
    pub tier: MatchTier,

    /// Human-readable reason
    pub reason: String,

    pub status: CandidateStatus,
}

impl MappingCandidate {
    pub fn target_key(&self) -> SpecialtyKey {
        self.target.key()
    }
}

// ============================================================================
// CANDIDATE MATCHER
// ============================================================================

pub struct CandidateMatcher {
    scorer: SimilarityScorer,

    /// Interactive suggestion threshold (default: 0.6)
    pub suggest_threshold: f64,

    /// Cross-vendor bulk search threshold (default: 0.5)
    pub bulk_threshold: f64,
}

impl CandidateMatcher {
    pub fn new(registry: &SynonymRegistry) -> Self {
        Self::with_scorer(SimilarityScorer::new(registry), registry.config())
    }

    pub fn with_scorer(scorer: SimilarityScorer, config: &EngineConfig) -> Self {
        CandidateMatcher {
            scorer,
            suggest_threshold: config.suggest_threshold,
            bulk_threshold: config.bulk_threshold,
        }
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Candidates at or above the interactive threshold
    pub fn find_candidates(&self, source: &SourceSpecialty, pool: &[SourceSpecialty]) -> Vec<MappingCandidate> {
        self.find_candidates_above(source, pool, self.suggest_threshold)
    }

    /// Score `source` against every pool member from another vendor, keep
    /// those ≥ `threshold`, one per target identity, highest confidence first
    pub fn find_candidates_above(
        &self,
        source: &SourceSpecialty,
        pool: &[SourceSpecialty],
        threshold: f64,
    ) -> Vec<MappingCandidate> {
        let source_key = source.key();
        let mut best: HashMap<SpecialtyKey, MappingCandidate> = HashMap::new();

        for target in pool {
            if target.same_vendor(source) {
                continue;
            }
            let target_key = target.key();
            if target_key == source_key {
                continue;
            }

            let similarity = self.scorer.evaluate(&source.name, &target.name);
            if similarity.confidence < threshold {
                continue;
            }

            let candidate = MappingCandidate {
                source: source_key.clone(),
                target: target.clone(),
                confidence: similarity.confidence,
                tier: similarity.tier,
                reason: format!(
                    "{}: {} ≈ {} ({})",
                    similarity.tier.describe(),
                    source.name,
                    target.name,
                    target.vendor
                ),
                status: CandidateStatus::Pending,
            };

            match best.get(&target_key) {
                Some(existing) if existing.confidence >= candidate.confidence => {}
                _ => {
                    best.insert(target_key, candidate);
                }
            }
        }

        let mut candidates: Vec<MappingCandidate> = best.into_values().collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.target_key().cmp(&b.target_key()))
        });
        candidates
    }

    /// Bulk search: candidates for every pool member, evaluated in parallel
    ///
    /// Results keep pool order; members without candidates are omitted.
    pub fn find_all_candidates(&self, pool: &[SourceSpecialty]) -> Vec<(SpecialtyKey, Vec<MappingCandidate>)> {
        self.find_all_candidates_above(pool, self.bulk_threshold)
    }

    pub fn find_all_candidates_above(
        &self,
        pool: &[SourceSpecialty],
        threshold: f64,
    ) -> Vec<(SpecialtyKey, Vec<MappingCandidate>)> {
        pool.par_iter()
            .map(|source| (source.key(), self.find_candidates_above(source, pool, threshold)))
            .filter(|(_, candidates)| !candidates.is_empty())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
