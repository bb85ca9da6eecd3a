//! Protocol messages exchanged between nodes of the command hierarchy.
//!
//! These carry semantic content only; wire encoding belongs to the host
//! network layer. Every message names its sender.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::id::Id;
use crate::track::TrackRecord;

/// All message kinds a node can receive or emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    TrackUpdate(TrackUpdateMessage),
    CombatStatus(CombatStatusMessage),
    Assignment(AssignmentMessage),
    AssignmentAck(AssignmentAckMessage),
    AssignmentTrack(AssignmentTrackMessage),
    Cue(CueMessage),
    /// Received but intentionally ignored by the assignment engine.
    Plot(PlotMessage),
    /// Received but intentionally ignored by the assignment engine.
    BearingReport(BearingReportMessage),
    /// Received but intentionally ignored by the assignment engine.
    WeaponsControl(WeaponsControlMessage),
}

impl Message {
    pub fn sender(&self) -> Id {
        match self {
            Message::TrackUpdate(m) => m.sender,
            Message::CombatStatus(m) => m.sender,
            Message::Assignment(m) => m.sender,
            Message::AssignmentAck(m) => m.sender,
            Message::AssignmentTrack(m) => m.sender,
            Message::Cue(m) => m.sender,
            Message::Plot(m) => m.sender,
            Message::BearingReport(m) => m.sender,
            Message::WeaponsControl(m) => m.sender,
        }
    }
}

/// Periodic report about one master track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackUpdateMessage {
    pub sender: Id,
    pub track_id: Id,
    pub status: TrackingStatus,
    pub position_m: DVec3,
    pub velocity_ms: DVec3,
    /// Simulation time the kinematics were measured.
    pub data_time: f64,
    pub reporting_sensor: Option<SensorKind>,
    /// Truth name of the underlying target, for log lines only.
    #[serde(default)]
    pub truth_name: String,
}

/// Per-weapon slice of a combat status report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSystemStatus {
    /// Weapon sub-system id on the reporting asset.
    pub weapon_id: u32,
    pub munitions_ready: u32,
    pub total_munitions: u32,
    pub total_fire_channels: u32,
    pub allocated_fire_channels: u32,
}

/// An asset's self-reported position and readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStatusMessage {
    pub sender: Id,
    pub asset_id: Id,
    pub status_time: f64,
    pub system_status: SystemStatus,
    pub max_assignments: u32,
    pub current_assignments: u32,
    pub position_time: f64,
    pub position_m: DVec3,
    pub velocity_ms: DVec3,
    pub weapons: Vec<WeaponSystemStatus>,
}

/// A weapon-target assignment directive. The same record, once promoted
/// into the ledger, is the live assignment: its ack status field tracks the
/// latest acknowledgement received against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMessage {
    pub sender: Id,
    /// The assigning authority's track id for the target.
    pub reference_track_id: Id,
    /// This node's master track id for the target.
    pub local_track_id: Id,
    /// Unit (and weapon sub-system) directed to prosecute.
    pub assigned_id: Id,
    /// Unit that issued this directive.
    pub assigning_id: Id,
    /// Unit that originated the assignment decision.
    pub initiating_id: Id,
    pub reason: AssignReason,
    pub shot_doctrine: ShotDoctrine,
    pub requested_missiles_to_commit: u32,
    pub shots_fired: u32,
    /// Seconds after `assign_time` before the shot is considered expired.
    pub max_firing_time_s: f64,
    pub assign_time: f64,
    /// Latest acknowledgement applied to this assignment, if any.
    pub ack: Option<AssignmentAckMessage>,
    /// Simulated decision latency: the message must not be acted on before
    /// this time.
    pub latent_process_time: Option<f64>,
}

impl AssignmentMessage {
    /// True once the latest acknowledgement closes the assignment.
    pub fn is_complete(&self) -> bool {
        self.ack
            .as_ref()
            .is_some_and(|a| a.status.closes_assignment())
    }

    /// True when the assignment closed with the target defeated.
    pub fn was_success(&self) -> bool {
        self.ack.as_ref().is_some_and(|a| a.status.is_success())
    }

    /// Missiles to credit back when the assignment is released.
    pub fn uncommitted_missiles(&self) -> u32 {
        self.requested_missiles_to_commit
            .saturating_sub(self.shots_fired)
    }
}

/// Acknowledgement reporting progress (or refusal) against an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentAckMessage {
    pub sender: Id,
    pub ack_time: f64,
    pub assigned_id: Id,
    pub assigning_id: Id,
    pub initiating_id: Id,
    /// The assigning authority's track id, matching the directive.
    pub reference_track_id: Id,
    pub status: AckStatus,
    /// Human-readable reason, set on CANTCO and CANCELLED.
    pub reason: Option<String>,
    /// Present when the CANTCO is systemic (track structurally
    /// unengageable) rather than a transient refusal.
    pub systemic_scope: Option<CantcoScope>,
    /// CHANGED_ASSIGNED_UNIT: the authority that overrode the assignment.
    pub overriding_id: Option<Id>,
    /// CHANGED_ASSIGNED_UNIT: the unit now prosecuting.
    pub newly_assigned_id: Option<Id>,
    /// UPDATED_SHOT_DOCTRINE: the doctrine now in force.
    pub updated_shot_doctrine: Option<ShotDoctrine>,
    pub latent_process_time: Option<f64>,
}

impl AssignmentAckMessage {
    pub fn is_systemic_cantco(&self) -> bool {
        self.status == AckStatus::Cantco && self.systemic_scope.is_some()
    }
}

/// Track snapshot accompanying an assignment directive so the assignee can
/// prosecute a target it may not hold a track on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentTrackMessage {
    pub sender: Id,
    pub assigned_unit_id: Id,
    pub track: TrackRecord,
    pub latent_process_time: Option<f64>,
}

/// Directive to point a sensor at a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueMessage {
    pub sender: Id,
    pub reason: CueReason,
    pub reference_track_id: Id,
    pub local_track_id: Id,
    pub initiating_id: Id,
    pub cued_unit_id: Id,
    pub cued_sensor_id: Id,
}

/// Raw sensor plot report; not consumed by the assignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotMessage {
    pub sender: Id,
    pub data_time: f64,
    pub position_m: DVec3,
}

/// Passive bearing report; not consumed by the assignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingReportMessage {
    pub sender: Id,
    pub data_time: f64,
    pub bearing_rads: f64,
}

/// Weapons-control state broadcast; not consumed by the assignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponsControlMessage {
    pub sender: Id,
    pub weapons_free: bool,
}
