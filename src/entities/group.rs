// 🔗 Mapping Group - A committed set of equivalent vendor specialties
//
// Invariant: a (name, vendor) identity belongs to at most one group.
// The ledger enforces it; the group itself is a plain value.

use super::source::{SourceSpecialty, SpecialtyKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a group came to be committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrigin {
    /// Approved from generated suggestions
    Suggested,

    /// Committed by the auto-arrange batch
    AutoArranged,

    /// Chosen by hand, bypassing suggestions
    Manual,

    /// Explicit single-source mapping with no counterpart
    SingleSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingGroup {
    pub id: String,

    /// Members in commit order; the first member names the group
    pub members: Vec<SourceSpecialty>,

    pub created_at: DateTime<Utc>,

    pub is_single_source: bool,

    pub origin: GroupOrigin,
}

impl MappingGroup {
    pub fn new(members: Vec<SourceSpecialty>, origin: GroupOrigin) -> Self {
        let is_single_source = members.len() == 1;
        MappingGroup {
            id: uuid::Uuid::new_v4().to_string(),
            members,
            created_at: Utc::now(),
            is_single_source,
            origin,
        }
    }

    /// Every committed group is resolved; single-source implies resolved
    pub fn is_resolved(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn contains(&self, key: &SpecialtyKey) -> bool {
        self.members.iter().any(|m| &m.key() == key)
    }

    pub fn member_keys(&self) -> Vec<SpecialtyKey> {
        self.members.iter().map(SourceSpecialty::key).collect()
    }

    pub fn display_name(&self) -> &str {
        self.members.first().map(|m| m.name.as_str()).unwrap_or("")
    }

    /// Vendors represented in the group, in member order, without repeats
    pub fn vendors(&self) -> Vec<String> {
        let mut vendors: Vec<String> = Vec::new();
        for member in &self.members {
            if !vendors.iter().any(|v| v.eq_ignore_ascii_case(&member.vendor)) {
                vendors.push(member.vendor.clone());
            }
        }
        vendors
    }
}
