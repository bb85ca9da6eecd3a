//! Battle manager interface — the weapon-target pairing heuristic consumed
//! by the asset manager.
//!
//! The scoring and pairing algorithm behind [`BattleManager::evaluate`] is
//! opaque to this crate. Implementations are selected once by configuration
//! and injected at construction.

use aegis_core::messages::AssignmentMessage;
use aegis_core::{AssetMap, Id, TrackRecord};

/// A candidate track offered to the battle manager for evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationTrack {
    pub track: TrackRecord,
    /// The superior directive this node is re-delegating, when the track
    /// reached us as a delegated assignment rather than our own decision.
    pub delegate: Option<AssignmentMessage>,
}

impl EvaluationTrack {
    pub fn new(track: TrackRecord) -> Self {
        Self {
            track,
            delegate: None,
        }
    }

    pub fn delegated(track: TrackRecord, delegate: AssignmentMessage) -> Self {
        Self {
            track,
            delegate: Some(delegate),
        }
    }
}

/// A (track, weapon) pairing produced by the battle manager together with
/// its generated directive. Once promoted into the ledger this is the live
/// assignment record.
#[derive(Debug, Clone)]
pub struct EvaluatedAssignment {
    pub track: EvaluationTrack,
    pub assignment: AssignmentMessage,
    /// The battle manager overrode the delegated directive's assigned unit.
    pub is_overridden: bool,
    /// The battle manager overrode the delegated directive's shot doctrine.
    pub is_doctrine_updated: bool,
}

impl EvaluatedAssignment {
    pub fn new(track: EvaluationTrack, assignment: AssignmentMessage) -> Self {
        Self {
            track,
            assignment,
            is_overridden: false,
            is_doctrine_updated: false,
        }
    }

    /// The local master track this assignment prosecutes.
    pub fn track_id(&self) -> Id {
        self.track.track.id
    }

    /// The forwarded superior directive, when this node re-delegated.
    pub fn delegate(&self) -> Option<&AssignmentMessage> {
        self.track.delegate.as_ref()
    }
}

/// The weapon-target pairing engine consumed by the asset manager.
///
/// The asset manager owns all resource perception: it debits the C2 chain
/// when it promotes an evaluated assignment and credits it on cancellation
/// or completion. `evaluate` must only produce pairings, never adjust
/// assignment or munition counters itself.
pub trait BattleManager {
    /// Whether this node originates assignments (as opposed to receiving
    /// delegated directives from a superior).
    fn has_commit_authority(&self) -> bool;

    /// Structural engageability test for a track. A `false` here is
    /// systemic: the track cannot be prosecuted by this node at all.
    fn is_track_engageable(&self, track: &TrackRecord) -> bool;

    /// Discard the working set from the previous evaluation cycle.
    fn clear_evaluation_tracks(&mut self);

    /// Offer a candidate track for this cycle.
    fn add_track_for_evaluation(&mut self, track: EvaluationTrack);

    /// Pair offered tracks with weapons. Results are collected with
    /// [`BattleManager::take_evaluated_assignments`].
    fn evaluate(&mut self, assets: &AssetMap, current_time: f64);

    /// Drain the evaluated candidate pairings produced by `evaluate`.
    fn take_evaluated_assignments(&mut self) -> Vec<EvaluatedAssignment>;

    /// Battle-manager-internal assignment monitoring hook, run before the
    /// asset manager's own checks.
    fn run_monitor_assignments(&mut self, current_time: f64);
}
