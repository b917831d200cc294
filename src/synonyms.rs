// 📚 Synonym Registry - Canonical specialties and their synonym sets
//
// Global invariant: a normalized synonym belongs to at most ONE canonical
// specialty. Collisions are reported as SynonymConflict values with a
// suggested resolution; the registry is never mutated on a collision.

use crate::config::EngineConfig;
use crate::entities::{CanonicalSpecialty, SpecialtySource};
use crate::error::{EngineError, EngineResult, SynonymValidation};
use crate::history::{BoundedLog, HistoryFilter, SynonymAction, SynonymHistoryEntry, SynonymKind};
use crate::normalize::normalize;
use crate::taxonomy;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Punctuation accepted in raw synonym text (removed or replaced by `normalize`)
const ALLOWED_PUNCTUATION: &[char] = &['&', '/', '-', ',', '(', ')', '.', '\'', ':'];

// ============================================================================
// CONFLICTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Another specialty already lists the synonym
    DuplicateSynonym,

    /// The synonym is another specialty's name
    SpecialtyName,

    /// The target specialty already owns the synonym
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    /// The two specialties likely denote the same thing
    Merge,

    /// Choose a more specific synonym
    Rename,

    /// Nothing to do
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymConflict {
    pub synonym: String,
    pub existing_specialty_id: String,
    pub existing_specialty_name: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub suggested_action: SuggestedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddSynonymOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub conflict: Option<SynonymConflict>,
}

impl AddSynonymOutcome {
    fn added() -> Self {
        AddSynonymOutcome {
            success: true,
            message: Some("Synonym added".to_string()),
            conflict: None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        AddSynonymOutcome {
            success: false,
            message: Some(message.into()),
            conflict: None,
        }
    }

    fn conflicted(conflict: SynonymConflict) -> Self {
        let message = match conflict.conflict_type {
            ConflictType::AlreadyPresent => format!(
                "'{}' is already a synonym of {}",
                conflict.synonym, conflict.existing_specialty_name
            ),
            ConflictType::SpecialtyName => format!(
                "'{}' is the name of specialty {}",
                conflict.synonym, conflict.existing_specialty_name
            ),
            ConflictType::DuplicateSynonym => format!(
                "'{}' already belongs to {}",
                conflict.synonym, conflict.existing_specialty_name
            ),
        };

        AddSynonymOutcome {
            success: false,
            message: Some(message),
            conflict: Some(conflict),
        }
    }
}

// ============================================================================
// SYNONYM REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct SynonymRegistry {
    specialties: Vec<CanonicalSpecialty>,
    history: BoundedLog<SynonymHistoryEntry>,
    config: EngineConfig,
}

impl SynonymRegistry {
    /// Create an empty registry
    pub fn new(config: EngineConfig) -> Self {
        SynonymRegistry {
            specialties: Vec::new(),
            history: BoundedLog::new(),
            config,
        }
    }

    /// Create a registry seeded with the predefined taxonomy
    pub fn with_defaults(config: EngineConfig) -> Self {
        let mut registry = SynonymRegistry::new(config);

        for specialty in taxonomy::seed_specialties() {
            let clash = specialty
                .normalized_forms()
                .into_iter()
                .find(|form| registry.owner_of(form, None).is_some());

            match clash {
                Some(form) => warn!(specialty = %specialty.name, synonym = %form, "skipping seed specialty with duplicate synonym"),
                None => registry.specialties.push(specialty),
            }
        }

        registry
    }

    /// Rebuild from persisted parts
    pub fn from_parts(
        specialties: Vec<CanonicalSpecialty>,
        history: BoundedLog<SynonymHistoryEntry>,
        config: EngineConfig,
    ) -> Self {
        SynonymRegistry {
            specialties,
            history,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub fn specialties(&self) -> &[CanonicalSpecialty] {
        &self.specialties
    }

    pub fn history(&self) -> &BoundedLog<SynonymHistoryEntry> {
        &self.history
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalSpecialty> {
        self.specialties.iter().find(|s| s.id == id)
    }

    pub fn count(&self) -> usize {
        self.specialties.len()
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Validate synonym text: character set, normalized length, reserved words
    pub fn validate_synonym(&self, text: &str) -> SynonymValidation {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SynonymValidation::invalid("Synonym cannot be empty");
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c)))
        {
            return SynonymValidation::invalid(format!("Unsupported character '{}'", bad));
        }

        let normalized = normalize(trimmed);
        let len = normalized.chars().count();
        if len < self.config.synonym_min_len {
            return SynonymValidation::invalid(format!(
                "Synonym must be at least {} characters",
                self.config.synonym_min_len
            ));
        }
        if len > self.config.synonym_max_len {
            return SynonymValidation::invalid(format!(
                "Synonym must be at most {} characters",
                self.config.synonym_max_len
            ));
        }

        if self.config.is_reserved(&normalized) {
            return SynonymValidation::invalid(format!("'{}' is a reserved word", normalized));
        }

        SynonymValidation::valid()
    }

    /// Specialty (other than `except_id`) that owns a normalized form
    fn owner_of(&self, normalized: &str, except_id: Option<&str>) -> Option<&CanonicalSpecialty> {
        self.specialties
            .iter()
            .filter(|s| Some(s.id.as_str()) != except_id)
            .find(|s| s.owns(normalized))
    }

    fn conflict_with(&self, synonym: &str, target_category: &str, owner: &CanonicalSpecialty) -> SynonymConflict {
        let normalized = normalize(synonym);
        let (conflict_type, suggested_action) = if normalize(&owner.name) == normalized {
            (ConflictType::SpecialtyName, SuggestedAction::Merge)
        } else if owner.category.eq_ignore_ascii_case(target_category) {
            (ConflictType::DuplicateSynonym, SuggestedAction::Merge)
        } else {
            (ConflictType::DuplicateSynonym, SuggestedAction::Rename)
        };

        SynonymConflict {
            synonym: synonym.trim().to_string(),
            existing_specialty_id: owner.id.clone(),
            existing_specialty_name: owner.name.clone(),
            conflict_type,
            suggested_action,
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Add a synonym to a specialty
    ///
    /// Rejections (unknown specialty, validation, collisions) come back as
    /// `success: false`; nothing is mutated in that case.
    pub fn add_synonym(&mut self, specialty_id: &str, text: &str, is_predefined: bool) -> AddSynonymOutcome {
        let Some(index) = self.specialties.iter().position(|s| s.id == specialty_id) else {
            return AddSynonymOutcome::rejected(format!("Specialty not found: {}", specialty_id));
        };

        let validation = self.validate_synonym(text);
        if !validation.is_valid {
            return AddSynonymOutcome::rejected(validation.message.unwrap_or_default());
        }

        let synonym = text.trim().to_string();
        let normalized = normalize(&synonym);
        let target = &self.specialties[index];

        if target.owns(&normalized) {
            return AddSynonymOutcome::conflicted(SynonymConflict {
                synonym,
                existing_specialty_id: target.id.clone(),
                existing_specialty_name: target.name.clone(),
                conflict_type: ConflictType::AlreadyPresent,
                suggested_action: SuggestedAction::Skip,
            });
        }

        if let Some(owner) = self.owner_of(&normalized, Some(specialty_id)) {
            let conflict = self.conflict_with(&synonym, &target.category, owner);
            debug!(synonym = %synonym, owner = %owner.name, "synonym conflict");
            return AddSynonymOutcome::conflicted(conflict);
        }

        let specialty = &mut self.specialties[index];
        let kind = if is_predefined {
            specialty.synonyms.predefined.insert(synonym.clone());
            SynonymKind::Predefined
        } else {
            specialty.synonyms.custom.insert(synonym.clone());
            SynonymKind::Custom
        };
        specialty.touch();

        self.history.push(
            SynonymHistoryEntry {
                specialty_id: specialty_id.to_string(),
                synonym,
                action: SynonymAction::Add,
                timestamp: Utc::now(),
                kind,
            },
            self.config.history_limit,
        );

        AddSynonymOutcome::added()
    }

    /// Remove a synonym (normalized match) from both lists
    ///
    /// Returns whether anything was removed.
    pub fn remove_synonym(&mut self, specialty_id: &str, text: &str) -> bool {
        let Some(specialty) = self.specialties.iter_mut().find(|s| s.id == specialty_id) else {
            return false;
        };

        let normalized = normalize(text);
        let before_predefined = specialty.synonyms.predefined.len();
        let before_custom = specialty.synonyms.custom.len();

        specialty.synonyms.predefined.retain(|s| normalize(s) != normalized);
        specialty.synonyms.custom.retain(|s| normalize(s) != normalized);

        let removed_predefined = specialty.synonyms.predefined.len() < before_predefined;
        let removed_custom = specialty.synonyms.custom.len() < before_custom;
        if !removed_predefined && !removed_custom {
            return false;
        }

        specialty.touch();
        self.history.push(
            SynonymHistoryEntry {
                specialty_id: specialty_id.to_string(),
                synonym: text.trim().to_string(),
                action: SynonymAction::Remove,
                timestamp: Utc::now(),
                kind: if removed_predefined {
                    SynonymKind::Predefined
                } else {
                    SynonymKind::Custom
                },
            },
            self.config.history_limit,
        );

        true
    }

    /// Create a custom canonical specialty; returns its id
    pub fn create_specialty(&mut self, name: &str, category: &str) -> EngineResult<String> {
        let validation = self.validate_synonym(name);
        if !validation.is_valid {
            return Err(EngineError::InvalidName(validation.message.unwrap_or_default()));
        }

        let normalized = normalize(name);
        if let Some(owner) = self.owner_of(&normalized, None) {
            return Err(EngineError::InvalidName(format!(
                "'{}' is already used by {}",
                name.trim(),
                owner.name
            )));
        }

        let category = if category.trim().is_empty() {
            "Uncategorized"
        } else {
            category
        };

        let specialty = CanonicalSpecialty::new(name, category, SpecialtySource::Custom);
        let id = specialty.id.clone();
        self.specialties.push(specialty);
        Ok(id)
    }

    /// Explicit delete; specialties are never removed any other way
    pub fn delete_specialty(&mut self, id: &str) -> bool {
        let before = self.specialties.len();
        self.specialties.retain(|s| s.id != id);
        self.specialties.len() < before
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Union of predefined and custom synonyms
    pub fn get_synonyms(&self, specialty_id: &str) -> BTreeSet<String> {
        self.get(specialty_id)
            .map(|s| s.synonyms.all())
            .unwrap_or_default()
    }

    /// Canonical specialty whose name or synonym equals `name` after normalization
    pub fn lookup(&self, name: &str) -> Option<&CanonicalSpecialty> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return None;
        }

        self.specialties
            .iter()
            .find(|s| normalize(&s.name) == normalized)
            .or_else(|| self.owner_of(&normalized, None))
    }

    /// Mechanical variants of `name` that would pass synonym validation
    ///
    /// Example: "OB/GYN" → ["OBGYN", "OB GYN", "OB-GYN"]
    pub fn get_suggestions(&self, name: &str) -> Vec<String> {
        let base = collapse_spaces(name.trim());
        let mut variants: Vec<String> = Vec::new();

        if base.contains('&') {
            variants.push(base.replace('&', " and "));
        }
        if base.to_lowercase().contains(" and ") {
            variants.push(replace_word_ci(&base, "and", "&"));
        }
        if base.contains(['-', '/', ',']) {
            variants.push(base.replace(['-', '/', ','], ""));
            variants.push(base.replace(['-', '/', ','], " "));
        }
        if base.contains('/') {
            variants.push(base.replace('/', "-"));
        }
        if base.contains('-') {
            variants.push(base.replace('-', "/"));
        }
        if base.contains(' ') {
            variants.push(base.replace(' ', "-"));
            variants.push(base.replace(' ', "/"));
        }

        let mut suggestions: Vec<String> = Vec::new();
        for variant in variants {
            let variant = collapse_spaces(&variant);
            if variant == base || suggestions.contains(&variant) {
                continue;
            }
            if self.validate_synonym(&variant).is_valid {
                suggestions.push(variant);
            }
        }

        suggestions
    }

    /// Synonyms of `specialty_id` that collide with another specialty
    pub fn get_conflicts(&self, specialty_id: &str) -> Vec<SynonymConflict> {
        let Some(specialty) = self.get(specialty_id) else {
            return Vec::new();
        };

        let mut conflicts = Vec::new();
        let mut names = vec![specialty.name.clone()];
        names.extend(specialty.synonyms.all());

        for synonym in names {
            let normalized = normalize(&synonym);
            for other in self.specialties.iter().filter(|s| s.id != specialty.id) {
                if other.owns(&normalized) {
                    conflicts.push(self.conflict_with(&synonym, &specialty.category, other));
                }
            }
        }

        conflicts
    }

    /// Every pair of specialties that share a normalized form
    pub fn all_conflicts(&self) -> Vec<SynonymConflict> {
        self.specialties
            .iter()
            .flat_map(|s| self.get_conflicts(&s.id))
            .collect()
    }

    /// Specialties whose name, synonyms or category contain the query
    pub fn search_specialties(&self, query: &str) -> Vec<&CanonicalSpecialty> {
        let needle = normalize(query);
        let mut matches: Vec<&CanonicalSpecialty> = self
            .specialties
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || normalize(&s.category).contains(&needle)
                    || s.normalized_forms().iter().any(|form| form.contains(&needle))
            })
            .collect();

        matches.sort_by(|a, b| {
            let a_exact = normalize(&a.name) == needle;
            let b_exact = normalize(&b.name) == needle;
            b_exact.cmp(&a_exact).then_with(|| a.name.cmp(&b.name))
        });

        matches
    }

    /// History entries matching the filter, newest first
    pub fn get_history(&self, filter: &HistoryFilter) -> Vec<SynonymHistoryEntry> {
        filter.apply(&self.history).into_iter().cloned().collect()
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace a whole word, case-insensitively, keeping the rest intact
fn replace_word_ci(text: &str, word: &str, replacement: &str) -> String {
    text.split(' ')
        .map(|w| if w.eq_ignore_ascii_case(word) { replacement } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SynonymRegistry {
        SynonymRegistry::with_defaults(EngineConfig::default())
    }

    fn id_of(registry: &SynonymRegistry, name: &str) -> String {
        registry.lookup(name).unwrap().id.clone()
    }

    #[test]
    fn test_add_synonym_success() {
        let mut registry = registry();
        let id = id_of(&registry, "Family Medicine");

        let outcome = registry.add_synonym(&id, "Family Med", false);

        assert!(outcome.success);
        assert!(registry.get_synonyms(&id).contains("Family Med"));
        assert_eq!(registry.history().len(), 1);
        assert_eq!(registry.lookup("family med").unwrap().id, id);
    }

    #[test]
    fn test_add_synonym_conflict_does_not_mutate() {
        let mut registry = registry();
        let cardiology = id_of(&registry, "Cardiology");
        let family = id_of(&registry, "Family Medicine");

        let cardiology_before = registry.get(&cardiology).unwrap().clone();
        let family_before = registry.get(&family).unwrap().clone();

        // Owned by Family Medicine after normalization
        let outcome = registry.add_synonym(&cardiology, "FAMILY-PRACTICE", false);

        assert!(!outcome.success);
        let conflict = outcome.conflict.unwrap();
        assert_eq!(conflict.existing_specialty_id, family);
        assert_eq!(conflict.conflict_type, ConflictType::DuplicateSynonym);
        assert_eq!(conflict.suggested_action, SuggestedAction::Rename);

        assert_eq!(registry.get(&cardiology).unwrap(), &cardiology_before);
        assert_eq!(registry.get(&family).unwrap(), &family_before);
        assert!(registry.history().is_empty());
    }

    #[test]
    fn test_conflict_with_same_category_suggests_merge() {
        let mut registry = registry();
        let interventional = id_of(&registry, "Interventional Cardiology");

        let outcome = registry.add_synonym(&interventional, "Cardiovascular Disease", false);
        assert_eq!(outcome.conflict.unwrap().suggested_action, SuggestedAction::Merge);

        let outcome = registry.add_synonym(&interventional, "Cardiology", false);
        let conflict = outcome.conflict.unwrap();
        assert_eq!(conflict.conflict_type, ConflictType::SpecialtyName);
        assert_eq!(conflict.suggested_action, SuggestedAction::Merge);
    }

    #[test]
    fn test_add_existing_synonym_is_skip() {
        let mut registry = registry();
        let id = id_of(&registry, "Family Medicine");

        let outcome = registry.add_synonym(&id, "family practice", false);
        assert!(!outcome.success);
        assert_eq!(outcome.conflict.unwrap().suggested_action, SuggestedAction::Skip);
    }

    #[test]
    fn test_validation_rules() {
        let registry = registry();

        assert!(registry.validate_synonym("Sports Medicine").is_valid);
        assert!(registry.validate_synonym("Hem/Onc (Adult)").is_valid);
        assert!(!registry.validate_synonym("").is_valid);
        assert!(!registry.validate_synonym("x").is_valid);
        assert!(!registry.validate_synonym("Misc").is_valid);
        assert!(!registry.validate_synonym("Other").is_valid);
        assert!(!registry.validate_synonym("Surgery #1").is_valid);
        assert!(!registry.validate_synonym(&"a".repeat(101)).is_valid);
        assert!(registry.validate_synonym(&"a".repeat(100)).is_valid);

        // "the x" normalizes to one character
        assert!(!registry.validate_synonym("The X").is_valid);
    }

    #[test]
    fn test_validation_failure_is_a_value() {
        let mut registry = registry();
        let id = id_of(&registry, "Neurology");

        let outcome = registry.add_synonym(&id, "unknown", false);
        assert!(!outcome.success);
        assert!(outcome.conflict.is_none());
        assert!(outcome.message.unwrap().contains("reserved"));

        let outcome = registry.add_synonym("no-such-id", "Neuro", false);
        assert!(!outcome.success);
    }

    #[test]
    fn test_remove_synonym() {
        let mut registry = registry();
        let id = id_of(&registry, "Family Medicine");

        assert!(registry.remove_synonym(&id, "FAMILY PRACTICE"));
        assert!(!registry.get_synonyms(&id).contains("Family Practice"));
        assert!(!registry.remove_synonym(&id, "Family Practice"));
        assert!(!registry.remove_synonym("no-such-id", "Family Practice"));

        let history = registry.get_history(&HistoryFilter::for_specialty(&id));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, SynonymAction::Remove);
        assert_eq!(history[0].kind, SynonymKind::Predefined);
    }

    #[test]
    fn test_remove_then_add_elsewhere() {
        let mut registry = registry();
        let family = id_of(&registry, "Family Medicine");
        let urgent = id_of(&registry, "Urgent Care");

        assert!(registry.remove_synonym(&family, "FM"));
        assert!(registry.add_synonym(&urgent, "FM", false).success);
        assert_eq!(registry.lookup("fm").unwrap().id, urgent);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = EngineConfig {
            history_limit: 3,
            ..EngineConfig::default()
        };
        let mut registry = SynonymRegistry::with_defaults(config);
        let id = id_of(&registry, "Dermatology");

        for name in ["Derm A", "Derm B", "Derm C", "Derm D", "Derm E"] {
            assert!(registry.add_synonym(&id, name, false).success);
        }

        let history = registry.get_history(&HistoryFilter::default());
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].synonym, "Derm E");
        assert_eq!(history[2].synonym, "Derm C");
    }

    #[test]
    fn test_get_suggestions() {
        let registry = registry();

        let suggestions = registry.get_suggestions("OB/GYN");
        assert!(suggestions.contains(&"OBGYN".to_string()));
        assert!(suggestions.contains(&"OB GYN".to_string()));
        assert!(suggestions.contains(&"OB-GYN".to_string()));
        assert!(!suggestions.contains(&"OB/GYN".to_string()));

        let suggestions = registry.get_suggestions("Obstetrics & Gynecology");
        assert!(suggestions.contains(&"Obstetrics and Gynecology".to_string()));
        assert!(suggestions.contains(&"Obstetrics-&-Gynecology".to_string()));

        let suggestions = registry.get_suggestions("Ear Nose and Throat");
        assert!(suggestions.contains(&"Ear Nose & Throat".to_string()));
        assert!(suggestions.contains(&"Ear-Nose-and-Throat".to_string()));
        assert!(suggestions.contains(&"Ear/Nose/and/Throat".to_string()));
    }

    #[test]
    fn test_suggestions_filtered_by_validation() {
        let registry = registry();
        // Single word, no separators: nothing to vary
        assert!(registry.get_suggestions("Cardiology").is_empty());
        assert!(registry.get_suggestions("misc").is_empty());
        // "Misc Other" → "Misc-Other" etc. are not reserved once joined
        assert!(!registry.get_suggestions("Misc Other").is_empty());
    }

    #[test]
    fn test_create_and_delete_specialty() {
        let mut registry = registry();
        let before = registry.count();

        let id = registry.create_specialty("Sports Medicine", "Primary Care").unwrap();
        assert_eq!(registry.count(), before + 1);
        assert_eq!(registry.get(&id).unwrap().metadata.source, SpecialtySource::Custom);

        // Name already owned (synonym of Family Medicine)
        assert!(matches!(
            registry.create_specialty("Family Practice", "Primary Care"),
            Err(EngineError::InvalidName(_))
        ));
        assert!(registry.create_specialty("Various", "").is_err());

        assert!(registry.delete_specialty(&id));
        assert!(!registry.delete_specialty(&id));
        assert_eq!(registry.count(), before);
    }

    #[test]
    fn test_search_specialties() {
        let registry = registry();

        let results = registry.search_specialties("cardiology");
        assert_eq!(results[0].name, "Cardiology");
        assert!(results.iter().any(|s| s.name == "Interventional Cardiology"));
        assert!(results.iter().any(|s| s.name == "Pediatric Cardiology"));

        let surgical = registry.search_specialties("surgical");
        assert!(surgical.iter().all(|s| s.category == taxonomy::SURGICAL));

        assert_eq!(registry.search_specialties("").len(), registry.count());
        assert!(registry.search_specialties("zzzz").is_empty());
    }

    #[test]
    fn test_get_conflicts_detects_imported_duplicates() {
        let mut specialties = taxonomy::seed_specialties();
        specialties[1].synonyms.custom.insert("Family Practice".to_string());
        let internal_id = specialties[1].id.clone();

        let registry = SynonymRegistry::from_parts(specialties, BoundedLog::new(), EngineConfig::default());

        let conflicts = registry.get_conflicts(&internal_id);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].existing_specialty_name, "Family Medicine");
        assert_eq!(conflicts[0].suggested_action, SuggestedAction::Merge);
        assert_eq!(registry.all_conflicts().len(), 2);

        assert!(registry.get_conflicts("missing").is_empty());
    }
}
