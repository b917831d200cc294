// 🩺 Canonical Specialty Entity - Standardized taxonomy entry
//
// "Specialty name is a VALUE, specialty id is IDENTITY"
//
// Vendor labels such as "Cardiology - Noninvasive" or "Cardiovascular Disease"
// are reconciled onto one canonical entry through its synonym sets.

use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// SPECIALTY SOURCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialtySource {
    /// Seeded from the built-in taxonomy
    Predefined,

    /// Created by explicit user action
    Custom,
}

impl SpecialtySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialtySource::Predefined => "predefined",
            SpecialtySource::Custom => "custom",
        }
    }
}

// ============================================================================
// SYNONYM SETS
// ============================================================================

/// Synonyms are stored as entered (trimmed); comparisons use `normalize`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynonymSets {
    pub predefined: BTreeSet<String>,
    pub custom: BTreeSet<String>,
}

impl SynonymSets {
    /// Union of predefined and custom synonyms
    pub fn all(&self) -> BTreeSet<String> {
        self.predefined.union(&self.custom).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.predefined.is_empty() && self.custom.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyMetadata {
    pub last_modified: DateTime<Utc>,
    pub source: SpecialtySource,
}

// ============================================================================
// CANONICAL SPECIALTY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSpecialty {
    /// Stable identity (UUID)
    pub id: String,

    /// Display name (e.g., "Family Medicine")
    pub name: String,

    /// Grouping used by the category similarity tier (e.g., "Primary Care")
    pub category: String,

    pub synonyms: SynonymSets,

    pub metadata: SpecialtyMetadata,
}

impl CanonicalSpecialty {
    pub fn new(name: &str, category: &str, source: SpecialtySource) -> Self {
        CanonicalSpecialty {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            synonyms: SynonymSets::default(),
            metadata: SpecialtyMetadata {
                last_modified: Utc::now(),
                source,
            },
        }
    }

    /// Normalized forms of the name and every synonym
    pub fn normalized_forms(&self) -> BTreeSet<String> {
        let mut forms: BTreeSet<String> = self
            .synonyms
            .all()
            .iter()
            .map(|s| normalize(s))
            .filter(|s| !s.is_empty())
            .collect();

        let name = normalize(&self.name);
        if !name.is_empty() {
            forms.insert(name);
        }

        forms
    }

    /// Normalized forms of the synonyms only
    pub fn normalized_synonyms(&self) -> BTreeSet<String> {
        self.synonyms.all().iter().map(|s| normalize(s)).collect()
    }

    /// Whether `normalized` is this specialty's name or one of its synonyms
    pub fn owns(&self, normalized: &str) -> bool {
        normalize(&self.name) == normalized
            || self.synonyms.all().iter().any(|s| normalize(s) == normalized)
    }

    pub fn touch(&mut self) {
        self.metadata.last_modified = Utc::now();
    }
}
