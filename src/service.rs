// 🧭 Reconciliation Service - One engine instance over an injected store
//
// Every mutation runs against a clone of the current state. Durable changes
// (those that produce an OperationRecord) are persisted before the clone is
// swapped in, so a failed save leaves the in-memory state untouched.
//
// Candidate sessions are ephemeral: they live in memory only and are never
// part of a snapshot.

use crate::aggregation::{aggregate, CanonicalMarketData};
use crate::config::EngineConfig;
use crate::entities::{CanonicalSpecialty, MappingGroup, Metric, SourceSpecialty, SpecialtyKey};
use crate::error::{EngineError, EngineResult, SynonymValidation};
use crate::history::{BoundedLog, HistoryFilter, OperationKind, OperationRecord, SynonymHistoryEntry};
use crate::ledger::{IngestSummary, MappingGroupLedger, MappingState, Transition};
use crate::matcher::{CandidateMatcher, CandidateStatus, MappingCandidate};
use crate::store::{EngineSnapshot, SnapshotStore, SCHEMA_VERSION};
use crate::synonyms::{AddSynonymOutcome, SynonymConflict, SynonymRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Version of the export document layout
pub const EXPORT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation flag, checked between auto-arrange units
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoArrangeReport {
    /// Units examined before finishing or being cancelled
    pub processed: usize,
    pub groups_created: usize,
    pub members_mapped: usize,
    pub single_source: usize,
    /// Sources left unmapped for lack of a confident counterpart
    pub unmatched: usize,
    /// Sources already absorbed into an earlier group in this batch
    pub skipped: usize,
    pub cancelled: bool,
}

enum UnitOutcome {
    Grouped(usize),
    SingleSource,
    Unmatched,
    Skipped,
}

// ============================================================================
// EXPORT DOCUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub specialties: Vec<CanonicalSpecialty>,
    pub groups: Vec<MappingGroup>,
    #[serde(default)]
    pub unmapped: Vec<SourceSpecialty>,
    #[serde(default)]
    pub history: BoundedLog<SynonymHistoryEntry>,
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub operations: BoundedLog<OperationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,

    /// SHA-256 over the serialized `data`; verified on import when present
    #[serde(default)]
    pub checksum: Option<String>,

    pub data: ExportData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub specialties: usize,
    pub groups: usize,
    pub unmapped: usize,
}

fn checksum(data: &ExportData) -> EngineResult<String> {
    let bytes = serde_json::to_vec(data)
        .map_err(|e| EngineError::InvalidImport(format!("cannot serialize data: {}", e)))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Shape checks on raw JSON, before any typed parsing
fn check_shape(value: &serde_json::Value) -> EngineResult<()> {
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::InvalidImport("document is not a JSON object".to_string()))?;

    let data = object
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| EngineError::InvalidImport("missing 'data' object".to_string()))?;

    for field in ["specialties", "groups"] {
        if !data.get(field).map(|v| v.is_array()).unwrap_or(false) {
            return Err(EngineError::InvalidImport(format!("'data.{}' must be an array", field)));
        }
    }

    Ok(())
}

// ============================================================================
// ENGINE STATE
// ============================================================================

#[derive(Debug, Clone)]
struct EngineState {
    registry: SynonymRegistry,
    ledger: MappingGroupLedger,
    operations: BoundedLog<OperationRecord>,
    revision: u64,
}

impl EngineState {
    fn fresh(config: EngineConfig) -> Self {
        EngineState {
            registry: SynonymRegistry::with_defaults(config),
            ledger: MappingGroupLedger::new(),
            operations: BoundedLog::new(),
            revision: 0,
        }
    }

    fn from_snapshot(snapshot: EngineSnapshot) -> EngineResult<Self> {
        let ledger = MappingGroupLedger::from_parts(snapshot.unmapped, snapshot.groups)?;
        Ok(EngineState {
            registry: SynonymRegistry::from_parts(snapshot.specialties, snapshot.history, snapshot.config),
            ledger,
            operations: snapshot.operations,
            revision: snapshot.revision,
        })
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            schema_version: SCHEMA_VERSION,
            revision: self.revision,
            specialties: self.registry.specialties().to_vec(),
            groups: self.ledger.groups().to_vec(),
            unmapped: self.ledger.pool().to_vec(),
            history: self.registry.history().clone(),
            config: self.registry.config().clone(),
            operations: self.operations.clone(),
        }
    }

    fn matcher(&self) -> CandidateMatcher {
        CandidateMatcher::new(&self.registry)
    }

    fn market_data(&self, group_id: &str) -> EngineResult<CanonicalMarketData> {
        self.ledger
            .group(group_id)
            .map(aggregate)
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct ReconciliationService {
    store: Arc<dyn SnapshotStore>,
    state: RwLock<EngineState>,
    actor: String,
}

impl ReconciliationService {
    /// Load the engine from `store`, seeding the taxonomy when it is empty
    pub fn open(store: Arc<dyn SnapshotStore>) -> EngineResult<Self> {
        Self::open_with_config(store, EngineConfig::default())
    }

    /// Like `open`; `config` only applies when the store is empty
    pub fn open_with_config(store: Arc<dyn SnapshotStore>, config: EngineConfig) -> EngineResult<Self> {
        let loaded = store.load_all().map_err(|e| {
            let message = format!("{:#}", e);
            error!(error = %message, "failed to load snapshot");
            EngineError::Persistence(message)
        })?;

        let state = match loaded {
            Some(snapshot) => {
                info!(revision = snapshot.revision, "loaded engine snapshot");
                EngineState::from_snapshot(snapshot)?
            }
            None => {
                info!("empty store; seeding default taxonomy");
                EngineState::fresh(config)
            }
        };

        Ok(ReconciliationService {
            store,
            state: RwLock::new(state),
            actor: "system".to_string(),
        })
    }

    /// Name recorded as the actor of every operation
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, kind: OperationKind, entity_id: &str, data: serde_json::Value) -> Option<OperationRecord> {
        Some(OperationRecord::new(kind, entity_id, data, &self.actor))
    }

    /// Clone, apply, persist (when the change is durable), then swap
    fn mutate<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&mut EngineState) -> EngineResult<(T, Option<OperationRecord>)>,
    {
        let mut state = self.write();
        let mut next = state.clone();
        let (value, record) = op(&mut next)?;

        if let Some(record) = record {
            debug!(kind = record.kind.as_str(), entity = %record.entity_id, "recording operation");
            let limit = next.registry.config().operations_limit;
            next.operations.push(record, limit);
            next.revision = state.revision + 1;
            self.persist(&next)?;
        }

        *state = next;
        Ok(value)
    }

    fn persist(&self, state: &EngineState) -> EngineResult<()> {
        self.store.save_all(&state.snapshot()).map_err(|e| {
            let message = format!("{:#}", e);
            error!(error = %message, revision = state.revision, "persistence failed; in-memory state unchanged");
            match e.downcast_ref::<EngineError>() {
                Some(stale @ EngineError::StaleRevision { .. }) => stale.clone(),
                _ => EngineError::Persistence(message),
            }
        })
    }

    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    // ========================================================================
    // CONFIG
    // ========================================================================

    pub fn config(&self) -> EngineConfig {
        self.read().registry.config().clone()
    }

    pub fn update_config(&self, config: EngineConfig) -> EngineResult<()> {
        self.mutate(|state| {
            state.registry.set_config(config);
            let data = serde_json::to_value(state.registry.config()).unwrap_or_default();
            Ok(((), self.record(OperationKind::ConfigUpdated, "config", data)))
        })
    }

    // ========================================================================
    // CANONICAL SPECIALTIES & SYNONYMS
    // ========================================================================

    pub fn specialties(&self) -> Vec<CanonicalSpecialty> {
        self.read().registry.specialties().to_vec()
    }

    pub fn specialty(&self, id: &str) -> Option<CanonicalSpecialty> {
        self.read().registry.get(id).cloned()
    }

    pub fn create_specialty(&self, name: &str, category: &str) -> EngineResult<String> {
        self.mutate(|state| {
            let id = state.registry.create_specialty(name, category)?;
            info!(specialty_id = %id, name = %name.trim(), "specialty created");
            let record = self.record(
                OperationKind::SpecialtyCreated,
                &id,
                json!({ "name": name.trim(), "category": category.trim() }),
            );
            Ok((id, record))
        })
    }

    pub fn delete_specialty(&self, id: &str) -> EngineResult<bool> {
        self.mutate(|state| {
            let name = state.registry.get(id).map(|s| s.name.clone());
            if !state.registry.delete_specialty(id) {
                return Ok((false, None));
            }
            info!(specialty_id = %id, "specialty deleted");
            Ok((true, self.record(OperationKind::SpecialtyDeleted, id, json!({ "name": name }))))
        })
    }

    pub fn validate_synonym(&self, text: &str) -> SynonymValidation {
        self.read().registry.validate_synonym(text)
    }

    pub fn add_synonym(&self, specialty_id: &str, text: &str, is_predefined: bool) -> EngineResult<AddSynonymOutcome> {
        self.mutate(|state| {
            let outcome = state.registry.add_synonym(specialty_id, text, is_predefined);
            let record = if outcome.success {
                self.record(
                    OperationKind::SynonymAdded,
                    specialty_id,
                    json!({ "synonym": text.trim(), "predefined": is_predefined }),
                )
            } else {
                None
            };
            Ok((outcome, record))
        })
    }

    pub fn remove_synonym(&self, specialty_id: &str, text: &str) -> EngineResult<bool> {
        self.mutate(|state| {
            if !state.registry.remove_synonym(specialty_id, text) {
                return Ok((false, None));
            }
            let record = self.record(OperationKind::SynonymRemoved, specialty_id, json!({ "synonym": text.trim() }));
            Ok((true, record))
        })
    }

    pub fn get_synonyms(&self, specialty_id: &str) -> Vec<String> {
        self.read().registry.get_synonyms(specialty_id).into_iter().collect()
    }

    pub fn lookup(&self, name: &str) -> Option<CanonicalSpecialty> {
        self.read().registry.lookup(name).cloned()
    }

    pub fn search_specialties(&self, query: &str) -> Vec<CanonicalSpecialty> {
        self.read()
            .registry
            .search_specialties(query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_suggestions(&self, name: &str) -> Vec<String> {
        self.read().registry.get_suggestions(name)
    }

    pub fn get_conflicts(&self, specialty_id: &str) -> Vec<SynonymConflict> {
        self.read().registry.get_conflicts(specialty_id)
    }

    pub fn get_history(&self, filter: &HistoryFilter) -> Vec<SynonymHistoryEntry> {
        self.read().registry.get_history(filter)
    }

    pub fn operations(&self) -> Vec<OperationRecord> {
        self.read().operations.iter().cloned().collect()
    }

    // ========================================================================
    // UNMAPPED POOL & SUGGESTIONS
    // ========================================================================

    pub fn ingest(&self, rows: Vec<SourceSpecialty>) -> EngineResult<IngestSummary> {
        self.mutate(|state| {
            let summary = state.ledger.ingest(rows);
            info!(
                added = summary.added,
                duplicates = summary.duplicates,
                already_mapped = summary.already_mapped,
                "sources ingested"
            );
            let record = if summary.added > 0 {
                self.record(
                    OperationKind::SourcesIngested,
                    "pool",
                    serde_json::to_value(&summary).unwrap_or_default(),
                )
            } else {
                None
            };
            Ok((summary, record))
        })
    }

    pub fn unmapped(&self) -> Vec<SourceSpecialty> {
        self.read().ledger.pool().to_vec()
    }

    pub fn suggest(&self, key: &SpecialtyKey) -> EngineResult<Vec<MappingCandidate>> {
        self.mutate(|state| {
            let matcher = state.matcher();
            state.ledger.suggest(key, &matcher)?;
            Ok((state.ledger.candidates_for(key).to_vec(), None))
        })
    }

    pub fn candidates_for(&self, key: &SpecialtyKey) -> Vec<MappingCandidate> {
        self.read().ledger.candidates_for(key).to_vec()
    }

    pub fn state_of(&self, key: &SpecialtyKey) -> Option<MappingState> {
        self.read().ledger.state_of(key)
    }

    /// Bulk cross-vendor search over the whole pool
    pub fn find_all_candidates(&self) -> Vec<(SpecialtyKey, Vec<MappingCandidate>)> {
        let state = self.read();
        state.matcher().find_all_candidates(state.ledger.pool())
    }

    // ========================================================================
    // DECISIONS & COMMITS
    // ========================================================================

    pub fn update_status(
        &self,
        source: &SpecialtyKey,
        target: &SpecialtyKey,
        status: CandidateStatus,
    ) -> EngineResult<Transition> {
        self.mutate(|state| {
            let transition = state.ledger.update_status(source, target, status)?;
            let record = transition
                .group_id
                .as_deref()
                .and_then(|id| self.group_record(state, id));
            Ok((transition, record))
        })
    }

    pub fn mark_single_source(&self, key: &SpecialtyKey) -> EngineResult<String> {
        self.mutate(|state| {
            let id = state.ledger.mark_single_source(key)?;
            let record = self.group_record(state, &id);
            Ok((id, record))
        })
    }

    pub fn commit_manual(&self, keys: &[SpecialtyKey]) -> EngineResult<String> {
        self.mutate(|state| {
            let id = state.ledger.commit_manual(keys)?;
            let record = self.group_record(state, &id);
            Ok((id, record))
        })
    }

    fn group_record(&self, state: &EngineState, group_id: &str) -> Option<OperationRecord> {
        let groups = state.ledger.groups();
        let position = groups.iter().position(|g| g.id == group_id)?;
        let group = &groups[position];
        let members: Vec<String> = group.member_keys().iter().map(ToString::to_string).collect();
        // Sessions finalized by pruning commit right after this group
        let cascaded: Vec<&str> = groups[position + 1..].iter().map(|g| g.id.as_str()).collect();
        self.record(
            OperationKind::GroupCommitted,
            group_id,
            json!({ "origin": group.origin, "members": members, "cascaded": cascaded }),
        )
    }

    pub fn remove_group(&self, group_id: &str) -> EngineResult<MappingGroup> {
        self.mutate(|state| {
            let group = state.ledger.remove_group(group_id)?;
            let record = self.record(
                OperationKind::GroupRemoved,
                group_id,
                json!({ "members": group.members.len() }),
            );
            Ok((group, record))
        })
    }

    /// Delete every group, returning all members to the pool
    pub fn clear_all_mappings(&self) -> EngineResult<usize> {
        self.mutate(|state| {
            let removed = state.ledger.clear_all();
            let record = if removed > 0 {
                self.record(OperationKind::MappingsCleared, "groups", json!({ "groups": removed }))
            } else {
                None
            };
            Ok((removed, record))
        })
    }

    pub fn groups(&self) -> Vec<MappingGroup> {
        self.read().ledger.groups().to_vec()
    }

    pub fn group(&self, group_id: &str) -> Option<MappingGroup> {
        self.read().ledger.group(group_id).cloned()
    }

    // ========================================================================
    // AUTO-ARRANGE
    // ========================================================================

    /// Commit every confident cross-vendor match, one source at a time
    ///
    /// Candidates are scored in parallel up front; each unit then commits
    /// independently, so units finished before cancellation stay committed.
    pub fn auto_arrange(&self, token: &CancellationToken) -> EngineResult<AutoArrangeReport> {
        let (order, proposals, config) = {
            let state = self.read();
            let config = state.registry.config().clone();
            let pool = state.ledger.pool();
            let proposals: HashMap<SpecialtyKey, Vec<MappingCandidate>> = state
                .matcher()
                .find_all_candidates_above(pool, config.auto_accept_threshold)
                .into_iter()
                .collect();
            let order: Vec<SpecialtyKey> = pool.iter().map(SourceSpecialty::key).collect();
            (order, proposals, config)
        };

        info!(units = order.len(), proposals = proposals.len(), "auto-arrange started");
        let mut report = AutoArrangeReport::default();

        for key in order {
            if token.is_cancelled() {
                report.cancelled = true;
                warn!(processed = report.processed, "auto-arrange cancelled");
                break;
            }

            let candidates = proposals.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let outcome = self.arrange_unit(&key, candidates, config.auto_single_source)?;
            report.processed += 1;

            match outcome {
                UnitOutcome::Grouped(members) => {
                    report.groups_created += 1;
                    report.members_mapped += members;
                }
                UnitOutcome::SingleSource => {
                    report.single_source += 1;
                    report.members_mapped += 1;
                }
                UnitOutcome::Unmatched => report.unmatched += 1,
                UnitOutcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            groups = report.groups_created,
            mapped = report.members_mapped,
            unmatched = report.unmatched,
            "auto-arrange finished"
        );
        Ok(report)
    }

    fn arrange_unit(
        &self,
        key: &SpecialtyKey,
        candidates: &[MappingCandidate],
        single_source: bool,
    ) -> EngineResult<UnitOutcome> {
        self.mutate(|state| {
            if !state.ledger.in_pool(key) {
                return Ok((UnitOutcome::Skipped, None));
            }

            // Best still-unmapped candidate per vendor
            let mut vendors: HashSet<String> = HashSet::from([key.vendor.clone()]);
            let mut members = vec![key.clone()];
            for candidate in candidates {
                let target = candidate.target_key();
                if state.ledger.in_pool(&target) && vendors.insert(target.vendor.clone()) {
                    members.push(target);
                }
            }

            if members.len() > 1 {
                let id = state.ledger.commit_auto(&members)?;
                let record = self.group_record(state, &id);
                return Ok((UnitOutcome::Grouped(members.len()), record));
            }

            if single_source {
                let id = state.ledger.mark_single_source(key)?;
                let record = self.group_record(state, &id);
                return Ok((UnitOutcome::SingleSource, record));
            }

            Ok((UnitOutcome::Unmatched, None))
        })
    }

    // ========================================================================
    // MARKET DATA
    // ========================================================================

    pub fn market_data(&self, group_id: &str) -> EngineResult<CanonicalMarketData> {
        self.read().market_data(group_id)
    }

    pub fn all_market_data(&self) -> Vec<CanonicalMarketData> {
        self.read().ledger.groups().iter().map(aggregate).collect()
    }

    /// Percentile of `value` within a group's canonical breakpoints
    pub fn percentile_rank(&self, group_id: &str, metric: Metric, value: f64) -> EngineResult<f64> {
        self.read().market_data(group_id)?.percentile_rank(metric, value)
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    pub fn export_document(&self) -> EngineResult<ExportDocument> {
        let state = self.read();
        let data = ExportData {
            specialties: state.registry.specialties().to_vec(),
            groups: state.ledger.groups().to_vec(),
            unmapped: state.ledger.pool().to_vec(),
            history: state.registry.history().clone(),
            config: state.registry.config().clone(),
            operations: state.operations.clone(),
        };

        Ok(ExportDocument {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            checksum: Some(checksum(&data)?),
            data,
        })
    }

    pub fn export_data(&self) -> EngineResult<String> {
        let document = self.export_document()?;
        serde_json::to_string_pretty(&document)
            .map_err(|e| EngineError::Persistence(format!("Failed to serialize export: {}", e)))
    }

    /// Replace all state with an exported document; `false` on any rejection
    pub fn import_data(&self, json: &str) -> bool {
        match self.import_data_detailed(json) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "import rejected");
                false
            }
        }
    }

    /// Validate the whole document first; nothing changes unless it all passes
    pub fn import_data_detailed(&self, json: &str) -> EngineResult<ImportSummary> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidImport(format!("malformed JSON: {}", e)))?;
        check_shape(&value)?;

        let document: ExportDocument =
            serde_json::from_value(value).map_err(|e| EngineError::InvalidImport(e.to_string()))?;

        if document.format_version > EXPORT_FORMAT_VERSION {
            return Err(EngineError::InvalidImport(format!(
                "unsupported format version {}",
                document.format_version
            )));
        }
        if let Some(expected) = &document.checksum {
            if &checksum(&document.data)? != expected {
                return Err(EngineError::InvalidImport("checksum mismatch".to_string()));
            }
        }

        let data = document.data;
        let mut ids = HashSet::new();
        for specialty in &data.specialties {
            if specialty.name.trim().is_empty() {
                return Err(EngineError::InvalidImport(format!("specialty {} has no name", specialty.id)));
            }
            if !ids.insert(specialty.id.as_str()) {
                return Err(EngineError::InvalidImport(format!("duplicate specialty id {}", specialty.id)));
            }
        }

        let ledger = MappingGroupLedger::from_parts(data.unmapped, data.groups)
            .map_err(|e| EngineError::InvalidImport(e.to_string()))?;
        let summary = ImportSummary {
            specialties: data.specialties.len(),
            groups: ledger.groups().len(),
            unmapped: ledger.pool().len(),
        };
        let registry = SynonymRegistry::from_parts(data.specialties, data.history, data.config);
        if let Some(conflict) = registry.all_conflicts().first() {
            return Err(EngineError::InvalidImport(format!(
                "synonym '{}' is claimed by more than one specialty, including {}",
                conflict.synonym, conflict.existing_specialty_name
            )));
        }

        self.mutate(|state| {
            state.registry = registry;
            state.ledger = ledger;
            state.operations = data.operations;
            let record = self.record(
                OperationKind::DataImported,
                "import",
                serde_json::to_value(&summary).unwrap_or_default(),
            );
            Ok((summary.clone(), record))
        })
        .map(|summary| {
            info!(
                specialties = summary.specialties,
                groups = summary.groups,
                unmapped = summary.unmapped,
                "data imported"
            );
            summary
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
