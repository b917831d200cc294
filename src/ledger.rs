// 📒 Mapping Group Ledger - approve/reject/finalize state machine
//
//   Unmapped ──suggest──▶ SuggestionsPending ──update_status──▶ PartiallyResolved
//                                                                     │
//            all candidates terminal and ≥1 approved ─────────────────▶ Finalized
//   any ──mark_single_source──▶ SingleSource
//   Finalized / SingleSource ──clear_all / remove_group──▶ Unmapped
//
// Invariants:
// - a (name, vendor) identity is either in the unmapped pool or in exactly
//   one group, never both and never twice
// - commits are atomic: every member moves pool → group, or none does

use crate::entities::{GroupOrigin, MappingGroup, SourceSpecialty, SpecialtyKey};
use crate::error::{EngineError, EngineResult};
use crate::matcher::{CandidateMatcher, CandidateStatus, MappingCandidate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

// ============================================================================
// MAPPING STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingState {
    Unmapped,
    SuggestionsPending,
    PartiallyResolved,
    Finalized,
    SingleSource,
}

/// Result of a state-changing ledger call
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: MappingState,
    /// Set when the call committed a group
    pub group_id: Option<String>,
}

impl Transition {
    fn to(state: MappingState) -> Self {
        Transition { state, group_id: None }
    }

    fn committed(state: MappingState, group_id: String) -> Self {
        Transition {
            state,
            group_id: Some(group_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub added: usize,
    pub duplicates: usize,
    pub already_mapped: usize,
}

/// Pending-session state: any decision made means PartiallyResolved
fn session_state(candidates: &[MappingCandidate]) -> MappingState {
    if candidates.iter().any(|c| c.status.is_terminal()) {
        MappingState::PartiallyResolved
    } else {
        MappingState::SuggestionsPending
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MappingGroupLedger {
    /// Not-yet-mapped source specialties, in ingestion order
    pool: Vec<SourceSpecialty>,

    /// Committed groups, in commit order
    groups: Vec<MappingGroup>,

    /// Ephemeral candidate lists, keyed by the source they were generated for
    sessions: BTreeMap<SpecialtyKey, Vec<MappingCandidate>>,
}

impl MappingGroupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts, rejecting anything that breaks the
    /// one-identity-one-place invariant
    pub fn from_parts(pool: Vec<SourceSpecialty>, groups: Vec<MappingGroup>) -> EngineResult<Self> {
        let ledger = MappingGroupLedger {
            pool,
            groups,
            sessions: BTreeMap::new(),
        };
        ledger.check_invariants()?;
        Ok(ledger)
    }

    pub fn check_invariants(&self) -> EngineResult<()> {
        let mut seen: HashSet<SpecialtyKey> = HashSet::new();

        for source in &self.pool {
            if !seen.insert(source.key()) {
                return Err(EngineError::InvalidGroup(format!("{} appears twice in the pool", source.key())));
            }
        }
        for group in &self.groups {
            if group.members.is_empty() {
                return Err(EngineError::InvalidGroup(format!("group {} has no members", group.id)));
            }
            for member in &group.members {
                if !seen.insert(member.key()) {
                    return Err(EngineError::InvalidGroup(format!(
                        "{} is mapped more than once",
                        member.key()
                    )));
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn pool(&self) -> &[SourceSpecialty] {
        &self.pool
    }

    pub fn groups(&self) -> &[MappingGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&MappingGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_of(&self, key: &SpecialtyKey) -> Option<&MappingGroup> {
        self.groups.iter().find(|g| g.contains(key))
    }

    pub fn in_pool(&self, key: &SpecialtyKey) -> bool {
        self.pool.iter().any(|s| &s.key() == key)
    }

    fn pool_member(&self, key: &SpecialtyKey) -> EngineResult<&SourceSpecialty> {
        if let Some(source) = self.pool.iter().find(|s| &s.key() == key) {
            return Ok(source);
        }
        match self.group_of(key) {
            Some(group) => Err(EngineError::AlreadyMapped {
                key: key.clone(),
                group_id: group.id.clone(),
            }),
            None => Err(EngineError::SourceNotFound(key.clone())),
        }
    }

    /// Every identity the ledger knows about: pool ∪ group members
    pub fn universe(&self) -> BTreeSet<SpecialtyKey> {
        self.pool
            .iter()
            .map(SourceSpecialty::key)
            .chain(self.groups.iter().flat_map(MappingGroup::member_keys))
            .collect()
    }

    pub fn state_of(&self, key: &SpecialtyKey) -> Option<MappingState> {
        if let Some(group) = self.group_of(key) {
            return Some(if group.is_single_source {
                MappingState::SingleSource
            } else {
                MappingState::Finalized
            });
        }
        if !self.in_pool(key) {
            return None;
        }

        Some(match self.sessions.get(key) {
            None => MappingState::Unmapped,
            Some(candidates) => session_state(candidates),
        })
    }

    pub fn candidates_for(&self, key: &SpecialtyKey) -> &[MappingCandidate] {
        self.sessions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    // ========================================================================
    // INGESTION
    // ========================================================================

    /// Add source specialties to the unmapped pool
    ///
    /// Identities already pooled are duplicates; identities already in a
    /// group are skipped.
    pub fn ingest(&mut self, rows: Vec<SourceSpecialty>) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for row in rows {
            let key = row.key();
            if self.group_of(&key).is_some() {
                summary.already_mapped += 1;
            } else if self.in_pool(&key) {
                summary.duplicates += 1;
            } else {
                self.pool.push(row);
                summary.added += 1;
            }
        }

        summary
    }

    // ========================================================================
    // SUGGESTIONS
    // ========================================================================

    /// Generate candidates for a pooled source
    ///
    /// A non-empty list moves the source to SuggestionsPending; an empty one
    /// leaves it Unmapped.
    pub fn suggest(&mut self, key: &SpecialtyKey, matcher: &CandidateMatcher) -> EngineResult<Transition> {
        let source = self.pool_member(key)?;
        let candidates = matcher.find_candidates(source, &self.pool);

        if candidates.is_empty() {
            self.sessions.remove(key);
            return Ok(Transition::to(MappingState::Unmapped));
        }

        debug!(source = %key, candidates = candidates.len(), "suggestions generated");
        self.sessions.insert(key.clone(), candidates);
        Ok(Transition::to(MappingState::SuggestionsPending))
    }

    /// Set one candidate's status and advance the state machine
    ///
    /// Once every candidate is terminal: at least one approval commits the
    /// group (Finalized); all rejections return the source to Unmapped.
    pub fn update_status(
        &mut self,
        source: &SpecialtyKey,
        target: &SpecialtyKey,
        status: CandidateStatus,
    ) -> EngineResult<Transition> {
        let candidates = self
            .sessions
            .get_mut(source)
            .ok_or_else(|| EngineError::NoPendingSuggestions(source.clone()))?;

        let candidate = candidates
            .iter_mut()
            .find(|c| &c.target_key() == target)
            .ok_or_else(|| EngineError::CandidateNotFound {
                source: source.clone(),
                target: target.clone(),
            })?;

        let previous = candidate.status;
        candidate.status = status;

        match self.finalize(source) {
            Ok(transition) => Ok(transition),
            Err(e) => {
                // Commit refused: restore the candidate so nothing changed
                if let Some(c) = self
                    .sessions
                    .get_mut(source)
                    .and_then(|cs| cs.iter_mut().find(|c| &c.target_key() == target))
                {
                    c.status = previous;
                }
                Err(e)
            }
        }
    }

    /// Commit the session if every candidate has a terminal status
    pub fn finalize(&mut self, source: &SpecialtyKey) -> EngineResult<Transition> {
        let candidates = self
            .sessions
            .get(source)
            .ok_or_else(|| EngineError::NoPendingSuggestions(source.clone()))?;

        if candidates.iter().any(|c| !c.status.is_terminal()) {
            return Ok(Transition::to(session_state(candidates)));
        }

        let approved: Vec<SpecialtyKey> = candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Approved)
            .map(MappingCandidate::target_key)
            .collect();

        if approved.is_empty() {
            self.sessions.remove(source);
            debug!(source = %source, "all candidates rejected");
            return Ok(Transition::to(MappingState::Unmapped));
        }

        let mut members = vec![source.clone()];
        members.extend(approved);
        let group_id = self.commit(&members, GroupOrigin::Suggested)?;

        Ok(Transition::committed(MappingState::Finalized, group_id))
    }

    // ========================================================================
    // DIRECT COMMITS
    // ========================================================================

    /// Manual mode: commit 1..N chosen specialties as one group
    pub fn commit_manual(&mut self, keys: &[SpecialtyKey]) -> EngineResult<String> {
        self.commit(keys, GroupOrigin::Manual)
    }

    /// Commit an already-decided group (used by auto-arrange)
    pub fn commit_auto(&mut self, keys: &[SpecialtyKey]) -> EngineResult<String> {
        self.commit(keys, GroupOrigin::AutoArranged)
    }

    /// Explicit single-source mapping: a one-member group, no counterpart
    pub fn mark_single_source(&mut self, key: &SpecialtyKey) -> EngineResult<String> {
        self.commit(std::slice::from_ref(key), GroupOrigin::SingleSource)
    }

    /// Atomic commit: validate every member first, then move them all
    fn commit(&mut self, keys: &[SpecialtyKey], origin: GroupOrigin) -> EngineResult<String> {
        if keys.is_empty() {
            return Err(EngineError::InvalidGroup("a group needs at least one member".to_string()));
        }

        let mut distinct = HashSet::new();
        for key in keys {
            if !distinct.insert(key) {
                return Err(EngineError::InvalidGroup(format!("{} listed twice", key)));
            }
            self.pool_member(key)?;
        }

        let mut members = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(position) = self.pool.iter().position(|s| &s.key() == key) {
                members.push(self.pool.remove(position));
            }
        }

        let group = MappingGroup::new(members, origin);
        let group_id = group.id.clone();
        let committed: HashSet<SpecialtyKey> = keys.iter().cloned().collect();
        self.groups.push(group);
        info!(group_id = %group_id, members = keys.len(), origin = ?origin, "mapping group committed");

        self.prune_sessions(&committed);
        Ok(group_id)
    }

    /// Drop sessions owned by committed members and candidates pointing at them
    ///
    /// A session whose remaining candidates are all decided is finalized on
    /// the spot, which may commit further groups.
    fn prune_sessions(&mut self, committed: &HashSet<SpecialtyKey>) {
        let mut decided = Vec::new();
        self.sessions.retain(|source, candidates| {
            if committed.contains(source) {
                return false;
            }
            let before = candidates.len();
            candidates.retain(|c| !committed.contains(&c.target_key()));
            if candidates.len() < before
                && !candidates.is_empty()
                && candidates.iter().all(|c| c.status.is_terminal())
            {
                decided.push(source.clone());
            }
            !candidates.is_empty()
        });

        for source in decided {
            // A nested finalize may already have consumed this session
            if !self.sessions.contains_key(&source) {
                continue;
            }
            match self.finalize(&source) {
                Ok(transition) => debug!(source = %source, state = ?transition.state, "pruned session finalized"),
                Err(e) => warn!(source = %source, error = %e, "pruned session left undecided"),
            }
        }
    }

    // ========================================================================
    // RESETS
    // ========================================================================

    /// Return one group's members to the pool
    pub fn remove_group(&mut self, group_id: &str) -> EngineResult<MappingGroup> {
        let position = self
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))?;

        let group = self.groups.remove(position);
        self.pool.extend(group.members.iter().cloned());
        info!(group_id = %group_id, members = group.members.len(), "mapping group removed");
        Ok(group)
    }

    /// Delete every group and return all members to the pool
    ///
    /// Returns the number of groups removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.groups.len();
        for group in self.groups.drain(..) {
            self.pool.extend(group.members);
        }
        self.sessions.clear();
        info!(groups = removed, pool = self.pool.len(), "all mappings cleared");
        removed
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::synonyms::SynonymRegistry;

    fn matcher() -> CandidateMatcher {
        CandidateMatcher::new(&SynonymRegistry::with_defaults(EngineConfig::default()))
    }

    fn ledger() -> MappingGroupLedger {
        let mut ledger = MappingGroupLedger::new();
        ledger.ingest(vec![
            SourceSpecialty::new("Family Medicine", "MGMA"),
            SourceSpecialty::new("Family Practice", "SullivanCotter"),
            SourceSpecialty::new("Family Medicine (General)", "Gallagher"),
            SourceSpecialty::new("Dermatology", "MGMA"),
            SourceSpecialty::new("Dermatology", "Gallagher"),
            SourceSpecialty::new("Space Medicine", "MGMA"),
        ]);
        ledger
    }

    fn key(name: &str, vendor: &str) -> SpecialtyKey {
        SpecialtyKey::new(name, vendor)
    }

    #[test]
    fn test_ingest_deduplicates() {
        let mut ledger = ledger();
        let summary = ledger.ingest(vec![
            SourceSpecialty::new("FAMILY MEDICINE", "mgma"),
            SourceSpecialty::new("Neurology", "MGMA"),
        ]);

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(ledger.pool().len(), 7);
    }

    #[test]
    fn test_suggest_moves_to_pending() {
        let mut ledger = ledger();
        let source = key("Family Medicine", "MGMA");

        assert_eq!(ledger.state_of(&source), Some(MappingState::Unmapped));

        let transition = ledger.suggest(&source, &matcher()).unwrap();
        assert_eq!(transition.state, MappingState::SuggestionsPending);
        assert_eq!(ledger.state_of(&source), Some(MappingState::SuggestionsPending));
        assert_eq!(ledger.candidates_for(&source).len(), 2);
    }

    #[test]
    fn test_suggest_without_candidates_stays_unmapped() {
        let mut ledger = ledger();
        let source = key("Space Medicine", "MGMA");

        let transition = ledger.suggest(&source, &matcher()).unwrap();
        assert_eq!(transition.state, MappingState::Unmapped);
        assert!(ledger.candidates_for(&source).is_empty());
    }

    #[test]
    fn test_approve_reject_finalize() {
        let mut ledger = ledger();
        let source = key("Family Medicine", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();

        let t = ledger
            .update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Approved)
            .unwrap();
        assert_eq!(t.state, MappingState::PartiallyResolved);
        assert_eq!(ledger.state_of(&source), Some(MappingState::PartiallyResolved));
        assert!(t.group_id.is_none());

        let t = ledger
            .update_status(&source, &key("Family Medicine (General)", "Gallagher"), CandidateStatus::Rejected)
            .unwrap();
        assert_eq!(t.state, MappingState::Finalized);
        let group = ledger.group(&t.group_id.unwrap()).unwrap().clone();

        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[0].name, "Family Medicine");
        assert_eq!(group.origin, GroupOrigin::Suggested);
        assert!(!group.is_single_source);

        // Members left the pool; the rejected target stayed
        assert!(!ledger.in_pool(&source));
        assert!(!ledger.in_pool(&key("Family Practice", "SullivanCotter")));
        assert!(ledger.in_pool(&key("Family Medicine (General)", "Gallagher")));
        assert_eq!(ledger.state_of(&source), Some(MappingState::Finalized));
    }

    #[test]
    fn test_all_rejected_returns_to_unmapped() {
        let mut ledger = ledger();
        let source = key("Dermatology", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();

        let t = ledger
            .update_status(&source, &key("Dermatology", "Gallagher"), CandidateStatus::Rejected)
            .unwrap();

        assert_eq!(t.state, MappingState::Unmapped);
        assert_eq!(ledger.state_of(&source), Some(MappingState::Unmapped));
        assert!(ledger.groups().is_empty());
    }

    #[test]
    fn test_update_status_errors() {
        let mut ledger = ledger();
        let source = key("Family Medicine", "MGMA");

        assert!(matches!(
            ledger.update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Approved),
            Err(EngineError::NoPendingSuggestions(_))
        ));

        ledger.suggest(&source, &matcher()).unwrap();
        assert!(matches!(
            ledger.update_status(&source, &key("Dermatology", "Gallagher"), CandidateStatus::Approved),
            Err(EngineError::CandidateNotFound { .. })
        ));
    }

    #[test]
    fn test_committed_members_never_reappear_as_candidates() {
        let mut ledger = ledger();
        let matcher = matcher();
        let gallagher = key("Family Medicine (General)", "Gallagher");

        // A second session that points at members we are about to commit
        ledger.suggest(&gallagher, &matcher).unwrap();
        assert_eq!(ledger.candidates_for(&gallagher).len(), 2);

        ledger
            .commit_manual(&[key("Family Medicine", "MGMA"), key("Family Practice", "SullivanCotter")])
            .unwrap();

        // Stale session pruned; regenerating never brings them back
        assert!(ledger.candidates_for(&gallagher).is_empty());
        ledger.suggest(&gallagher, &matcher).unwrap();
        assert!(ledger.candidates_for(&gallagher).is_empty());
        assert_eq!(ledger.state_of(&gallagher), Some(MappingState::Unmapped));
    }

    #[test]
    fn test_commit_is_atomic() {
        let mut ledger = ledger();
        let first = ledger.commit_manual(&[key("Dermatology", "MGMA")]).unwrap();
        let pool_before = ledger.pool().to_vec();

        // Second member already grouped: nothing moves
        let result = ledger.commit_manual(&[key("Dermatology", "Gallagher"), key("Dermatology", "MGMA")]);

        assert!(matches!(result, Err(EngineError::AlreadyMapped { ref group_id, .. }) if *group_id == first));
        assert_eq!(ledger.pool(), pool_before.as_slice());
        assert_eq!(ledger.groups().len(), 1);

        assert!(matches!(
            ledger.commit_manual(&[key("Nope", "MGMA")]),
            Err(EngineError::SourceNotFound(_))
        ));
        assert!(matches!(ledger.commit_manual(&[]), Err(EngineError::InvalidGroup(_))));
        assert!(matches!(
            ledger.commit_manual(&[key("Space Medicine", "MGMA"), key("space medicine", "mgma")]),
            Err(EngineError::InvalidGroup(_))
        ));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_failed_finalize_restores_status() {
        let mut ledger = ledger();
        let matcher = matcher();
        let source = key("Dermatology", "MGMA");
        let target = key("Dermatology", "Gallagher");
        ledger.suggest(&source, &matcher).unwrap();

        // Sneak the target into a group behind the session's back
        let position = ledger.pool.iter().position(|s| s.key() == target).unwrap();
        let taken = ledger.pool.remove(position);
        ledger.groups.push(MappingGroup::new(vec![taken], GroupOrigin::Manual));

        let result = ledger.update_status(&source, &target, CandidateStatus::Approved);
        assert!(matches!(result, Err(EngineError::AlreadyMapped { .. })));
        assert_eq!(ledger.candidates_for(&source)[0].status, CandidateStatus::Pending);
        assert!(ledger.in_pool(&source));
    }

    fn family_ledger() -> MappingGroupLedger {
        let mut ledger = MappingGroupLedger::new();
        ledger.ingest(vec![
            SourceSpecialty::new("Family Medicine", "MGMA"),
            SourceSpecialty::new("Family Practice", "SullivanCotter"),
            SourceSpecialty::new("Family Medicine (General)", "Gallagher"),
            SourceSpecialty::new("Family Practice", "AMGA"),
        ]);
        ledger
    }

    #[test]
    fn test_pruned_session_with_all_decided_finalizes() {
        let mut ledger = family_ledger();
        let source = key("Family Medicine", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();
        assert_eq!(ledger.candidates_for(&source).len(), 3);

        ledger
            .update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Approved)
            .unwrap();
        ledger
            .update_status(&source, &key("Family Medicine (General)", "Gallagher"), CandidateStatus::Approved)
            .unwrap();
        assert_eq!(ledger.state_of(&source), Some(MappingState::PartiallyResolved));

        // The last pending target leaves the pool elsewhere
        ledger.mark_single_source(&key("Family Practice", "AMGA")).unwrap();

        assert_eq!(ledger.state_of(&source), Some(MappingState::Finalized));
        let group = ledger.group_of(&source).unwrap();
        assert_eq!(group.members.len(), 3);
        assert_eq!(group.origin, GroupOrigin::Suggested);
        assert_eq!(ledger.groups().len(), 2);
        assert!(ledger.candidates_for(&source).is_empty());
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_pruned_session_with_only_rejections_returns_to_unmapped() {
        let mut ledger = family_ledger();
        let source = key("Family Medicine", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();

        ledger
            .update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Rejected)
            .unwrap();
        ledger
            .update_status(&source, &key("Family Medicine (General)", "Gallagher"), CandidateStatus::Rejected)
            .unwrap();

        ledger.mark_single_source(&key("Family Practice", "AMGA")).unwrap();

        assert_eq!(ledger.state_of(&source), Some(MappingState::Unmapped));
        assert!(ledger.candidates_for(&source).is_empty());
        assert_eq!(ledger.groups().len(), 1);
    }

    #[test]
    fn test_pruned_session_with_pending_left_stays_open() {
        let mut ledger = family_ledger();
        let source = key("Family Medicine", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();

        ledger
            .update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Approved)
            .unwrap();
        ledger.mark_single_source(&key("Family Practice", "AMGA")).unwrap();

        assert_eq!(ledger.state_of(&source), Some(MappingState::PartiallyResolved));
        assert_eq!(ledger.candidates_for(&source).len(), 2);
        assert!(ledger.group_of(&source).is_none());
    }

    #[test]
    fn test_reverting_last_decision_reports_pending() {
        let mut ledger = ledger();
        let source = key("Family Medicine", "MGMA");
        let target = key("Family Practice", "SullivanCotter");
        ledger.suggest(&source, &matcher()).unwrap();

        ledger.update_status(&source, &target, CandidateStatus::Approved).unwrap();
        let t = ledger.update_status(&source, &target, CandidateStatus::Pending).unwrap();

        assert_eq!(t.state, MappingState::SuggestionsPending);
        assert_eq!(ledger.state_of(&source), Some(t.state));
        assert!(t.group_id.is_none());
    }

    #[test]
    fn test_manual_single_member_is_single_source() {
        let mut ledger = ledger();
        let id = ledger.commit_manual(&[key("Space Medicine", "MGMA")]).unwrap();

        let group = ledger.group(&id).unwrap();
        assert!(group.is_single_source);
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.origin, GroupOrigin::Manual);
        assert_eq!(ledger.state_of(&key("Space Medicine", "MGMA")), Some(MappingState::SingleSource));
    }

    #[test]
    fn test_mark_single_source_from_pending() {
        let mut ledger = ledger();
        let source = key("Family Medicine", "MGMA");
        ledger.suggest(&source, &matcher()).unwrap();

        let id = ledger.mark_single_source(&source).unwrap();

        assert_eq!(ledger.group(&id).unwrap().origin, GroupOrigin::SingleSource);
        assert_eq!(ledger.state_of(&source), Some(MappingState::SingleSource));
        assert!(ledger.candidates_for(&source).is_empty());
        assert!(matches!(
            ledger.mark_single_source(&source),
            Err(EngineError::AlreadyMapped { .. })
        ));
    }

    #[test]
    fn test_clear_all_reconstitutes_universe() {
        let mut ledger = ledger();
        let before = ledger.universe();
        let pool_size = ledger.pool().len();

        ledger
            .commit_manual(&[key("Family Medicine", "MGMA"), key("Family Practice", "SullivanCotter")])
            .unwrap();
        ledger.mark_single_source(&key("Space Medicine", "MGMA")).unwrap();
        assert_eq!(ledger.pool().len(), pool_size - 3);

        assert_eq!(ledger.clear_all(), 2);

        let after: BTreeSet<SpecialtyKey> = ledger.pool().iter().map(SourceSpecialty::key).collect();
        assert_eq!(after, before);
        assert_eq!(ledger.pool().len(), pool_size);
        assert!(ledger.groups().is_empty());
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_group() {
        let mut ledger = ledger();
        let id = ledger
            .commit_manual(&[key("Dermatology", "MGMA"), key("Dermatology", "Gallagher")])
            .unwrap();

        let removed = ledger.remove_group(&id).unwrap();
        assert_eq!(removed.members.len(), 2);
        assert!(ledger.in_pool(&key("Dermatology", "Gallagher")));
        assert!(matches!(ledger.remove_group(&id), Err(EngineError::GroupNotFound(_))));
    }

    #[test]
    fn test_from_parts_rejects_double_mapping() {
        let member = SourceSpecialty::new("Urology", "MGMA");
        let group = MappingGroup::new(vec![member.clone()], GroupOrigin::Manual);

        let result = MappingGroupLedger::from_parts(vec![member], vec![group]);
        assert!(matches!(result, Err(EngineError::InvalidGroup(_))));
    }
}
