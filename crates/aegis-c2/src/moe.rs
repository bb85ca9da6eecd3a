//! Measures-of-effectiveness logging sink.
//!
//! Every assignment creation, cancellation, CANTCO, WILCO, and HAVCO
//! transition is reported here for offline analysis, independently of the
//! protocol messages and the tracing log. Implementations must not block.

use aegis_core::enums::SensorKind;
use aegis_core::messages::{AssignmentAckMessage, AssignmentMessage};
use aegis_core::{Id, TrackRecord};

use crate::battle_manager::EvaluatedAssignment;

/// Engagement-event sink. All hooks default to no-ops so implementations
/// record only what they care about.
pub trait MoeLogger {
    /// An assignment was promoted into the ledger. `flag` is COMMANDED when
    /// the assignee is this node or a direct subordinate, DELEGATE
    /// otherwise.
    fn assignment(&mut self, _time: f64, _assignment: &EvaluatedAssignment, _flag: &str) {}

    /// An assignment was cancelled by `cancelling_unit` for `reason`.
    fn assignment_cancel(
        &mut self,
        _time: f64,
        _cancelling_unit: Id,
        _assignment: &EvaluatedAssignment,
        _reason: &str,
    ) {
    }

    /// A directive was refused (or an active assignment CANTCO'd).
    fn cantco_assignment(
        &mut self,
        _time: f64,
        _responding_unit: Id,
        _directive: &AssignmentMessage,
        _track: Option<&TrackRecord>,
        _reason: &str,
    ) {
    }

    fn wilco_assignment(
        &mut self,
        _time: f64,
        _ack: &AssignmentAckMessage,
        _assignment: &EvaluatedAssignment,
    ) {
    }

    fn havco_assignment(
        &mut self,
        _time: f64,
        _ack: &AssignmentAckMessage,
        _assignment: &EvaluatedAssignment,
    ) {
    }

    /// Any other internally generated status transition (FIRING etc).
    fn assignment_status(
        &mut self,
        _time: f64,
        _ack: &AssignmentAckMessage,
        _assignment: &EvaluatedAssignment,
    ) {
    }

    /// A TAR/TTR began tracking in support of an assignment.
    fn sensor_tracking(&mut self, _time: f64, _track: Option<&TrackRecord>, _kind: SensorKind) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoopMoeLogger;

impl MoeLogger for NoopMoeLogger {}
