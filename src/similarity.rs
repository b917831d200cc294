// 🎯 Similarity Scorer - Tiered confidence between two specialty names
//
// Tiers are evaluated in order, first match wins:
//   1. identical normalized names                 → 1.0
//   2. one name is a synonym of the other's owner  → 0.95
//   3. the two owners share a synonym              → 0.90
//   4. proper substring containment                → [0.7, 0.8]
//   5. owners in the same category                 → 0.85
//   6. token-set Jaccard with order penalty        → capped at 0.7
//   7. nothing in common                           → 0.0
//
// `score(a, b) == score(b, a)` and every result lies in [0, 1].
//
// The scorer owns an immutable index built from the registry, so one scorer
// can be shared across threads for a bulk search.

use crate::config::SimilarityThresholds;
use crate::entities::CanonicalSpecialty;
use crate::normalize::normalize;
use crate::synonyms::SynonymRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// MATCH TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    DirectSynonym,
    SharedSynonym,
    Substring,
    SameCategory,
    TokenOverlap,
    NoMatch,
}

impl MatchTier {
    pub fn describe(&self) -> &'static str {
        match self {
            MatchTier::Exact => "Exact match after normalization",
            MatchTier::DirectSynonym => "Known synonym of the same specialty",
            MatchTier::SharedSynonym => "Specialties share a synonym",
            MatchTier::Substring => "One name contains the other",
            MatchTier::SameCategory => "Same specialty category",
            MatchTier::TokenOverlap => "Overlapping words",
            MatchTier::NoMatch => "No similarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub confidence: f64,
    pub tier: MatchTier,
}

impl SimilarityScore {
    fn new(confidence: f64, tier: MatchTier) -> Self {
        SimilarityScore {
            confidence: confidence.clamp(0.0, 1.0),
            tier,
        }
    }

    fn none() -> Self {
        SimilarityScore {
            confidence: 0.0,
            tier: MatchTier::NoMatch,
        }
    }
}

// ============================================================================
// INDEX
// ============================================================================

#[derive(Debug, Clone)]
struct IndexedSpecialty {
    id: String,
    category: String,
    /// Normalized name + synonyms
    forms: BTreeSet<String>,
    /// Normalized synonyms only
    synonyms: BTreeSet<String>,
    /// Every word appearing in `forms`
    vocabulary: BTreeSet<String>,
}

impl IndexedSpecialty {
    fn from_specialty(specialty: &CanonicalSpecialty) -> Self {
        let forms = specialty.normalized_forms();
        let vocabulary = forms
            .iter()
            .flat_map(|f| f.split(' ').map(str::to_string))
            .filter(|t| !t.is_empty())
            .collect();

        IndexedSpecialty {
            id: specialty.id.clone(),
            category: specialty.category.trim().to_lowercase(),
            synonyms: specialty
                .normalized_synonyms()
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect(),
            forms,
            vocabulary,
        }
    }
}

// ============================================================================
// SIMILARITY SCORER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    entries: Vec<IndexedSpecialty>,
    /// Normalized form → entry index (first owner wins)
    owners: HashMap<String, usize>,
    thresholds: SimilarityThresholds,
}

impl SimilarityScorer {
    /// Build a scorer over the registry's current specialties
    pub fn new(registry: &SynonymRegistry) -> Self {
        Self::from_specialties(registry.specialties(), registry.config().thresholds.clone())
    }

    pub fn from_specialties(specialties: &[CanonicalSpecialty], thresholds: SimilarityThresholds) -> Self {
        let entries: Vec<IndexedSpecialty> = specialties.iter().map(IndexedSpecialty::from_specialty).collect();

        let mut owners = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            for form in &entry.forms {
                owners.entry(form.clone()).or_insert(index);
            }
        }

        SimilarityScorer {
            entries,
            owners,
            thresholds,
        }
    }

    /// Canonical specialty id a name resolves to, if any
    pub fn canonical_id(&self, name: &str) -> Option<&str> {
        self.resolve(&normalize(name)).map(|e| e.id.as_str())
    }

    fn resolve(&self, normalized: &str) -> Option<&IndexedSpecialty> {
        self.owners.get(normalized).map(|&i| &self.entries[i])
    }

    /// Confidence in [0, 1] that `a` and `b` denote the same specialty
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.evaluate(a, b).confidence
    }

    /// Confidence plus the tier that produced it
    pub fn evaluate(&self, a: &str, b: &str) -> SimilarityScore {
        let t = &self.thresholds;
        let na = normalize(a);
        let nb = normalize(b);

        // Nothing left to compare, e.g. names made only of stopwords
        if na.is_empty() || nb.is_empty() {
            return SimilarityScore::none();
        }

        // Tier 1
        if na == nb {
            return SimilarityScore::new(t.exact_match, MatchTier::Exact);
        }

        let sa = self.resolve(&na);
        let sb = self.resolve(&nb);

        // Tier 2
        let direct = sa.map_or(false, |s| s.forms.contains(&nb)) || sb.map_or(false, |s| s.forms.contains(&na));
        if direct {
            return SimilarityScore::new(t.direct_synonym, MatchTier::DirectSynonym);
        }

        // Tier 3
        if let (Some(x), Some(y)) = (sa, sb) {
            if !x.synonyms.is_disjoint(&y.synonyms) {
                return SimilarityScore::new(t.shared_synonym, MatchTier::SharedSynonym);
            }
        }

        // Tier 4
        if na.contains(&nb) || nb.contains(&na) {
            let len_a = na.chars().count() as f64;
            let len_b = nb.chars().count() as f64;
            let diff_ratio = (len_a - len_b).abs() / len_a.max(len_b);
            let confidence = (t.substring_ceiling - diff_ratio).max(t.substring_floor);
            return SimilarityScore::new(confidence, MatchTier::Substring);
        }

        // Tier 5
        if let (Some(x), Some(y)) = (sa, sb) {
            if !x.category.is_empty() && x.category == y.category {
                return SimilarityScore::new(t.same_category, MatchTier::SameCategory);
            }
        }

        // Tiers 6 and 7
        let overlap = self.token_overlap(&na, &nb, sa, sb);
        if overlap > 0.0 {
            SimilarityScore::new(overlap, MatchTier::TokenOverlap)
        } else {
            SimilarityScore::none()
        }
    }

    /// Jaccard over words (plus each side's synonym vocabulary), penalized per
    /// shared word pair whose relative order differs, capped
    fn token_overlap(
        &self,
        na: &str,
        nb: &str,
        sa: Option<&IndexedSpecialty>,
        sb: Option<&IndexedSpecialty>,
    ) -> f64 {
        let seq_a = unique_tokens(na);
        let seq_b = unique_tokens(nb);

        let mut set_a: BTreeSet<&str> = seq_a.iter().copied().collect();
        let mut set_b: BTreeSet<&str> = seq_b.iter().copied().collect();
        if let Some(s) = sa {
            set_a.extend(s.vocabulary.iter().map(String::as_str));
        }
        if let Some(s) = sb {
            set_b.extend(s.vocabulary.iter().map(String::as_str));
        }

        let intersection = set_a.intersection(&set_b).count();
        if intersection == 0 {
            return 0.0;
        }
        let union = set_a.union(&set_b).count();
        let jaccard = intersection as f64 / union as f64;

        let inversions = out_of_order_pairs(&seq_a, &seq_b);
        let penalized = jaccard * (1.0 - self.thresholds.order_penalty).powi(inversions as i32);

        penalized.min(self.thresholds.token_overlap_cap).max(0.0)
    }
}

/// Words in order of first occurrence
fn unique_tokens(normalized: &str) -> Vec<&str> {
    let mut seen = Vec::new();
    for token in normalized.split(' ').filter(|t| !t.is_empty()) {
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

/// Pairs of words present in both sequences whose relative order differs
fn out_of_order_pairs(seq_a: &[&str], seq_b: &[&str]) -> usize {
    let positions: Vec<usize> = seq_a
        .iter()
        .filter_map(|token| seq_b.iter().position(|t| t == token))
        .collect();

    let mut inversions = 0;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }
    inversions
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(&SynonymRegistry::with_defaults(EngineConfig::default()))
    }

    fn bare_scorer() -> SimilarityScorer {
        SimilarityScorer::from_specialties(&[], SimilarityThresholds::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {} got {}", expected, actual);
    }

    #[test]
    fn test_exact_after_normalization() {
        let scorer = scorer();
        let result = scorer.evaluate("Family Medicine (General)", "family-medicine general");

        assert_eq!(result.tier, MatchTier::Exact);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(scorer.score("Anything At All", "Anything At All"), 1.0);
    }

    #[test]
    fn test_direct_synonym() {
        let scorer = scorer();

        let result = scorer.evaluate("Family Practice", "Family Medicine");
        assert_eq!(result.tier, MatchTier::DirectSynonym);
        assert_eq!(result.confidence, 0.95);

        // Two synonyms of the same specialty
        assert_eq!(scorer.score("OB/GYN", "Obstetrics and Gynecology"), 0.95);
        assert_eq!(scorer.score("Hem/Onc", "Oncology/Hematology"), 0.95);
    }

    #[test]
    fn test_shared_synonym() {
        let mut a = CanonicalSpecialty::new("Sleep Medicine", "Medical Specialties", crate::entities::SpecialtySource::Custom);
        a.synonyms.custom.insert("Somnology".to_string());
        let mut b = CanonicalSpecialty::new("Sleep Disorders", "Behavioral Health", crate::entities::SpecialtySource::Custom);
        b.synonyms.custom.insert("Somnology".to_string());

        let scorer = SimilarityScorer::from_specialties(&[a, b], SimilarityThresholds::default());
        let result = scorer.evaluate("Sleep Medicine", "Sleep Disorders");

        assert_eq!(result.tier, MatchTier::SharedSynonym);
        assert_eq!(result.confidence, 0.90);
    }

    #[test]
    fn test_substring_range() {
        let scorer = bare_scorer();

        // "cardiology" (10) inside "cardiology adult" (16): 0.8 - 6/16 = 0.425 → floor 0.7
        let result = scorer.evaluate("Cardiology", "Cardiology Adult");
        assert_eq!(result.tier, MatchTier::Substring);
        assert_close(result.confidence, 0.7);

        // "sports medicine" (15) inside "sports medicines" (16): 0.8 - 1/16
        assert_close(scorer.score("Sports Medicine", "Sports Medicines"), 0.8 - 1.0 / 16.0);
    }

    #[test]
    fn test_same_category() {
        let scorer = scorer();
        let result = scorer.evaluate("Nephrology", "Rheumatology");

        assert_eq!(result.tier, MatchTier::SameCategory);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_substring_checked_before_category() {
        let scorer = scorer();
        // Both resolve into Medical Specialties, but containment wins first
        let result = scorer.evaluate("Cardiology", "Interventional Cardiology");
        assert_eq!(result.tier, MatchTier::Substring);
    }

    #[test]
    fn test_token_overlap_capped_and_penalized() {
        let scorer = bare_scorer();

        // {sports, medicine, adult} vs {sports, medicine, pediatric}: 2/4 = 0.5
        let in_order = scorer.evaluate("Sports Medicine Adult", "Sports Medicine Pediatric");
        assert_eq!(in_order.tier, MatchTier::TokenOverlap);
        assert_close(in_order.confidence, 0.5);

        // Same words, shared pair reversed: 0.5 * 0.9
        let reversed = scorer.score("Sports Medicine Adult", "Medicine Sports Pediatric");
        assert_close(reversed, 0.45);

        // Identical word sets in different order: 1.0 * 0.9 → capped to 0.7
        assert_close(scorer.score("Surgery Trauma", "Trauma Surgery"), 0.7);
    }

    #[test]
    fn test_no_overlap_is_zero() {
        let scorer = bare_scorer();
        let result = scorer.evaluate("Dermatology", "Neurosurgery");

        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_empty_normalized_names_never_match() {
        let scorer = scorer();
        let result = scorer.evaluate("the", "of");

        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(scorer.score("", ""), 0.0);
        assert_eq!(scorer.score("and", "Family Medicine"), 0.0);
    }

    #[test]
    fn test_symmetric_across_tiers() {
        let scorer = scorer();
        let pairs = [
            ("Family Practice", "Family Medicine"),
            ("Cardiology", "Cardiology: Pediatric"),
            ("Nephrology", "Rheumatology"),
            ("Sports Medicine Adult", "Medicine Sports Pediatric"),
            ("Pulmonary Critical Care", "Critical Care Medicine"),
            ("Dermatology", "Urology"),
            ("the", "of"),
        ];

        for (a, b) in pairs {
            assert_eq!(scorer.score(a, b), scorer.score(b, a), "asymmetric for {} / {}", a, b);
            let s = scorer.score(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_canonical_id() {
        let scorer = scorer();
        assert!(scorer.canonical_id("OBGYN").is_some());
        assert_eq!(scorer.canonical_id("OBGYN"), scorer.canonical_id("Obstetrics & Gynecology"));
        assert!(scorer.canonical_id("Space Medicine").is_none());
    }

    #[test]
    fn test_out_of_order_pairs() {
        assert_eq!(out_of_order_pairs(&["a", "b", "c"], &["a", "b", "c"]), 0);
        assert_eq!(out_of_order_pairs(&["a", "b", "c"], &["c", "b", "a"]), 3);
        assert_eq!(out_of_order_pairs(&["a", "x", "b"], &["b", "y", "a"]), 1);
    }
}
