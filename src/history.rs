// 📜 History - Append-only audit logs
//
// "Every change is an event." Two bounded logs:
// - SynonymHistoryEntry: synonym add/remove per canonical specialty
// - OperationRecord: every mutation the service commits (exported as `operations`)
//
// Both evict their oldest entries once the configured limit is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// BOUNDED LOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
}

impl<T> Default for BoundedLog<T> {
    fn default() -> Self {
        BoundedLog {
            entries: VecDeque::new(),
        }
    }
}

impl<T> BoundedLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append, evicting from the front until at most `limit` entries remain
    pub fn push(&mut self, entry: T, limit: usize) {
        self.entries.push_back(entry);
        while self.entries.len() > limit {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T> FromIterator<T> for BoundedLog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        BoundedLog {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// SYNONYM HISTORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynonymAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynonymKind {
    Predefined,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymHistoryEntry {
    pub specialty_id: String,
    pub synonym: String,
    pub action: SynonymAction,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SynonymKind,
}

/// Query filter for `get_history`; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub specialty_id: Option<String>,
    pub action: Option<SynonymAction>,
    pub since: Option<DateTime<Utc>>,
    /// Keep only the newest `limit` matches
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn for_specialty(id: &str) -> Self {
        HistoryFilter {
            specialty_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &SynonymHistoryEntry) -> bool {
        if let Some(id) = &self.specialty_id {
            if &entry.specialty_id != id {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        true
    }

    /// Apply the filter; results are newest first
    pub fn apply<'a>(&self, log: &'a BoundedLog<SynonymHistoryEntry>) -> Vec<&'a SynonymHistoryEntry> {
        let matches = log.iter().rev().filter(|e| self.matches(e));
        match self.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        }
    }
}

// ============================================================================
// OPERATION LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SpecialtyCreated,
    SpecialtyDeleted,
    SynonymAdded,
    SynonymRemoved,
    SourcesIngested,
    GroupCommitted,
    GroupRemoved,
    MappingsCleared,
    ConfigUpdated,
    DataImported,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::SpecialtyCreated => "specialty_created",
            OperationKind::SpecialtyDeleted => "specialty_deleted",
            OperationKind::SynonymAdded => "synonym_added",
            OperationKind::SynonymRemoved => "synonym_removed",
            OperationKind::SourcesIngested => "sources_ingested",
            OperationKind::GroupCommitted => "group_committed",
            OperationKind::GroupRemoved => "group_removed",
            OperationKind::MappingsCleared => "mappings_cleared",
            OperationKind::ConfigUpdated => "config_updated",
            OperationKind::DataImported => "data_imported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: OperationKind,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl OperationRecord {
    pub fn new(kind: OperationKind, entity_id: &str, data: serde_json::Value, actor: &str) -> Self {
        OperationRecord {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}
