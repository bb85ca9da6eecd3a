//! Assignment ledger and exclusion table.

use std::collections::HashMap;

use aegis_core::enums::CantcoScope;
use aegis_core::messages::AssignmentAckMessage;
use aegis_core::Id;

use crate::battle_manager::EvaluatedAssignment;

/// The table of live assignments, keyed by local master track id. A track
/// may carry several assignments (different assignees), but at most one
/// open assignment per (track, assignee) pair.
#[derive(Debug, Default)]
pub struct AssignmentLedger {
    by_track: HashMap<Id, Vec<EvaluatedAssignment>>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, evaled: EvaluatedAssignment) {
        self.by_track.entry(evaled.track_id()).or_default().push(evaled);
    }

    pub fn get(&self, track: Id, assigned: Id) -> Option<&EvaluatedAssignment> {
        self.by_track
            .get(&track)?
            .iter()
            .find(|ea| ea.assignment.assigned_id == assigned)
    }

    pub fn get_mut(&mut self, track: Id, assigned: Id) -> Option<&mut EvaluatedAssignment> {
        self.by_track
            .get_mut(&track)?
            .iter_mut()
            .find(|ea| ea.assignment.assigned_id == assigned)
    }

    /// All assignments prosecuting the given track.
    pub fn on_track(&self, track: Id) -> &[EvaluatedAssignment] {
        self.by_track.get(&track).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_track_assigned(&self, track: Id) -> bool {
        self.by_track.get(&track).is_some_and(|list| !list.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluatedAssignment> {
        self.by_track.values().flatten()
    }

    /// Locate the assignment an acknowledgement refers to: both assigned id
    /// and reference track id must match either the direct assignment or,
    /// when this node re-delegated, its delegate directive.
    pub fn resolve_ack(&self, ack: &AssignmentAckMessage) -> Option<(Id, usize)> {
        for (key, list) in &self.by_track {
            for (idx, ea) in list.iter().enumerate() {
                let a = &ea.assignment;
                let delegate = ea.delegate();
                let assigned_match = a.assigned_id == ack.assigned_id
                    || delegate.is_some_and(|d| d.assigned_id == ack.assigned_id);
                let reference_match = a.reference_track_id == ack.reference_track_id
                    || delegate.is_some_and(|d| d.reference_track_id == ack.reference_track_id);
                if assigned_match && reference_match {
                    return Some((*key, idx));
                }
            }
        }
        None
    }

    pub fn entry(&self, track: Id, idx: usize) -> Option<&EvaluatedAssignment> {
        self.by_track.get(&track)?.get(idx)
    }

    pub fn entry_mut(&mut self, track: Id, idx: usize) -> Option<&mut EvaluatedAssignment> {
        self.by_track.get_mut(&track)?.get_mut(idx)
    }

    /// Number of assignments not yet closed by an acknowledgement.
    pub fn count_incomplete(&self) -> usize {
        self.iter().filter(|ea| !ea.assignment.is_complete()).count()
    }

    /// True when an open assignment names the given weapon sub-system on
    /// this platform.
    pub fn weapon_has_assignments(&self, weapon_id: u32) -> bool {
        self.iter()
            .any(|ea| !ea.assignment.is_complete() && ea.assignment.assigned_id.sub_id == weapon_id)
    }

    /// Remove and return every closed assignment.
    pub fn remove_completed(&mut self) -> Vec<EvaluatedAssignment> {
        let mut removed = Vec::new();
        for list in self.by_track.values_mut() {
            let mut idx = 0;
            while idx < list.len() {
                if list[idx].assignment.is_complete() {
                    removed.push(list.remove(idx));
                } else {
                    idx += 1;
                }
            }
        }
        self.by_track.retain(|_, list| !list.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.by_track.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tracks rejected with a systemic CANTCO. Entries keep a track out of the
/// evaluation candidate set and persist until the referenced track is
/// deleted.
#[derive(Debug, Default)]
pub struct ExclusionTable {
    entries: HashMap<Id, CantcoScope>,
}

impl ExclusionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the exclusion carried by a systemic CANTCO acknowledgement.
    /// A GLOBAL scope supersedes an existing LOCAL one, never the reverse.
    pub fn add_from_ack(&mut self, ack: &AssignmentAckMessage) {
        let Some(scope) = ack.systemic_scope else {
            return;
        };
        let entry = self
            .entries
            .entry(ack.reference_track_id)
            .or_insert(scope);
        *entry = (*entry).max(scope);
    }

    pub fn is_excluded(&self, track: Id) -> bool {
        self.entries.contains_key(&track)
    }

    pub fn scope(&self, track: Id) -> Option<CantcoScope> {
        self.entries.get(&track).copied()
    }

    pub fn remove_track(&mut self, track: Id) {
        self.entries.remove(&track);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
