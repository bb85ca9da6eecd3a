//! The asset manager — the assignment coordination engine of one C2 node.
//!
//! `AssetManager` owns all mutable state for its node: the asset hierarchy,
//! the master track table, the assignment ledger, the exclusion table, and
//! the outgoing message queue. Cross-node coordination happens only through
//! message passing; nothing here is shared between nodes even when several
//! run in the same process.

use std::collections::HashMap;
use std::fmt;

use glam::DVec3;
use tracing::{debug, error, warn};

use aegis_core::enums::{AckStatus, AssignReason, SensorKind, SystemStatus};
use aegis_core::messages::{
    AssignmentAckMessage, AssignmentMessage, AssignmentTrackMessage, CombatStatusMessage, Message,
};
use aegis_core::{AssetMap, AssetRecord, Id, TrackRecord};

use crate::battle_manager::BattleManager;
use crate::config::AssetManagerConfig;
use crate::error::C2Error;
use crate::ledger::{AssignmentLedger, ExclusionTable};
use crate::moe::MoeLogger;
use crate::sensors::SensorManager;

/// Why an outgoing message was queued. The host dissemination layer keys
/// routing decisions off this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    UpdatedTrack,
    DroppedTrack,
    StatusReceived,
    RejectedAssignmentResponse,
    CancelAssignmentReceived,
    AssignmentAckReceived,
    AssignmentOverrideNotification,
    AssignmentMessageOut,
    SelfDefenseAssignmentCreated,
    SensorCue,
    AssignmentTrackUpdate,
}

impl fmt::Display for MessageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MessageAction::UpdatedTrack => "Updated Track",
            MessageAction::DroppedTrack => "Dropped Track",
            MessageAction::StatusReceived => "Status Received",
            MessageAction::RejectedAssignmentResponse => "Rejected Assignment Response",
            MessageAction::CancelAssignmentReceived => "Cancel Received Assignment",
            MessageAction::AssignmentAckReceived => "Assignment Status Received",
            MessageAction::AssignmentOverrideNotification => "Assignment Override Notification",
            MessageAction::AssignmentMessageOut => "Assignment Message Out",
            MessageAction::SelfDefenseAssignmentCreated => "Self Defense Assignment Created",
            MessageAction::SensorCue => "Sensor Cue",
            MessageAction::AssignmentTrackUpdate => "Assignment Track Update",
        };
        f.write_str(label)
    }
}

/// How a message sender relates to this node in the command hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRelation {
    Commander,
    Subordinate,
    Peer,
    Other,
}

/// The assignment coordination engine for one node of the command
/// hierarchy.
pub struct AssetManager {
    pub(crate) config: AssetManagerConfig,
    pub(crate) own_id: Id,

    pub(crate) assets: AssetMap,
    pub(crate) master_tracks: HashMap<Id, TrackRecord>,
    pub(crate) ledger: AssignmentLedger,
    pub(crate) exclusions: ExclusionTable,
    /// Delegated directives buffered for the next evaluation cycle, one
    /// outstanding per local track id.
    pub(crate) pending_delegations: HashMap<Id, AssignmentMessage>,
    pub(crate) outgoing: Vec<(MessageAction, Message)>,

    pub(crate) battle_manager: Option<Box<dyn BattleManager>>,
    pub(crate) sensor_manager: Option<Box<dyn SensorManager>>,
    pub(crate) moe: Box<dyn MoeLogger>,

    pub(crate) current_time: f64,
    pub(crate) status_initialized: bool,
}

impl AssetManager {
    /// Build the engine for the node identified by `config.own_id`. The
    /// own asset record must already be present in `assets`; without it the
    /// node cannot function.
    pub fn new(
        config: AssetManagerConfig,
        mut assets: AssetMap,
        moe: Box<dyn MoeLogger>,
    ) -> Result<Self, C2Error> {
        if !assets.contains(config.own_id) {
            return Err(C2Error::OwnAssetMissing(config.own_id));
        }

        for asset in assets.iter_mut() {
            asset.yellow_ageout_s = config.yellow_ageout_s;
            asset.red_ageout_s = config.red_ageout_s;
        }

        Ok(Self {
            own_id: config.own_id,
            config,
            assets,
            master_tracks: HashMap::new(),
            ledger: AssignmentLedger::new(),
            exclusions: ExclusionTable::new(),
            pending_delegations: HashMap::new(),
            outgoing: Vec::new(),
            battle_manager: None,
            sensor_manager: None,
            moe,
            current_time: 0.0,
            status_initialized: false,
        })
    }

    pub fn set_battle_manager(&mut self, battle_manager: Box<dyn BattleManager>) {
        self.battle_manager = Some(battle_manager);
    }

    pub fn set_sensor_manager(&mut self, sensor_manager: Box<dyn SensorManager>) {
        self.sensor_manager = Some(sensor_manager);
    }

    // --- Accessors ---

    pub fn own_id(&self) -> Id {
        self.own_id
    }

    pub fn config(&self) -> &AssetManagerConfig {
        &self.config
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    /// Mutable access for the host simulation to maintain truth data
    /// (weapon inventories, scripted asset states).
    pub fn assets_mut(&mut self) -> &mut AssetMap {
        &mut self.assets
    }

    pub fn master_tracks(&self) -> &HashMap<Id, TrackRecord> {
        &self.master_tracks
    }

    pub fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    pub fn exclusions(&self) -> &ExclusionTable {
        &self.exclusions
    }

    pub fn battle_manager(&self) -> Option<&dyn BattleManager> {
        self.battle_manager.as_deref()
    }

    pub fn sensor_manager(&self) -> Option<&dyn SensorManager> {
        self.sensor_manager.as_deref()
    }

    pub fn pending_delegation_count(&self) -> usize {
        self.pending_delegations.len()
    }

    /// Advance this node's clock. Call once at the top of each tick,
    /// before processing inbound messages.
    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
    }

    pub(crate) fn has_commit_authority(&self) -> bool {
        self.battle_manager
            .as_ref()
            .is_some_and(|bm| bm.has_commit_authority())
    }

    pub(crate) fn own_asset(&self) -> Option<&AssetRecord> {
        self.assets.get(self.own_id)
    }

    /// How the sender of a message relates to this node.
    pub fn sender_relation(&self, sender: Id) -> SenderRelation {
        let Some(own) = self.own_asset() else {
            return SenderRelation::Other;
        };
        if own.is_direct_commander(sender) {
            SenderRelation::Commander
        } else if own.is_direct_subordinate(sender) {
            SenderRelation::Subordinate
        } else if own.is_direct_peer(sender) {
            SenderRelation::Peer
        } else {
            SenderRelation::Other
        }
    }

    // --- Outgoing queue ---

    /// Hand the queued outbound messages to the host dissemination layer.
    pub fn drain_outgoing(&mut self) -> Vec<(MessageAction, Message)> {
        std::mem::take(&mut self.outgoing)
    }

    pub(crate) fn push_outgoing(&mut self, action: MessageAction, message: Message) {
        self.outgoing.push((action, message));
    }

    /// Queue a combat status report, coalescing with any queued report for
    /// the same asset: only the newest (by position/status timestamp) is
    /// retained.
    pub(crate) fn queue_status(&mut self, action: MessageAction, msg: CombatStatusMessage) {
        let existing = self.outgoing.iter().position(|(a, m)| {
            *a == action
                && matches!(m, Message::CombatStatus(s) if s.asset_id.same_unit(&msg.asset_id))
        });

        match existing {
            Some(idx) => {
                let newer = match &self.outgoing[idx].1 {
                    Message::CombatStatus(current) => {
                        current.position_time < msg.position_time
                            || current.status_time < msg.status_time
                    }
                    _ => false,
                };
                if newer {
                    self.outgoing[idx].1 = Message::CombatStatus(msg);
                } else {
                    debug!(
                        asset = %msg.asset_id,
                        "not updating queued status: stale report times"
                    );
                }
            }
            None => self.outgoing.push((action, Message::CombatStatus(msg))),
        }
    }

    /// Queue an assignment directive. Directives to other units (except
    /// cancellations) are paired with a track snapshot so the assignee can
    /// prosecute a target it holds no track on. With commit authority and
    /// a configured assignment delay, both messages carry a simulated
    /// latent process time.
    pub(crate) fn queue_assignment(&mut self, action: MessageAction, mut msg: AssignmentMessage) {
        let has_delay = self.has_commit_authority() && self.config.assignment_delay_s > 0.0;
        let latent_time = self.current_time + self.config.assignment_delay_s;

        if msg.reason != AssignReason::Cancel && !msg.assigned_id.same_unit(&self.own_id) {
            if let Some(track) = self.master_tracks.get(&msg.local_track_id) {
                let snapshot = AssignmentTrackMessage {
                    sender: self.own_id,
                    assigned_unit_id: msg.assigned_id,
                    track: track.clone(),
                    latent_process_time: has_delay.then_some(latent_time),
                };
                self.outgoing.push((
                    MessageAction::AssignmentTrackUpdate,
                    Message::AssignmentTrack(snapshot),
                ));
            } else {
                warn!(
                    track = %msg.local_track_id,
                    "no master track for assignment; cannot send assignment track update"
                );
            }
        }

        if has_delay {
            msg.latent_process_time = Some(latent_time);
        }
        self.outgoing.push((action, Message::Assignment(msg)));
    }

    /// Queue an assignment acknowledgement. When the ack belongs to a
    /// re-delegated assignment, the reference track id is rewritten to the
    /// superior directive's so the next level up can resolve it.
    pub(crate) fn queue_ack(&mut self, mut ack: AssignmentAckMessage) {
        if let Some((key, idx)) = self.ledger.resolve_ack(&ack) {
            if let Some(delegate) = self.ledger.entry(key, idx).and_then(|ea| ea.delegate()) {
                ack.reference_track_id = delegate.reference_track_id;
            }
        }
        self.outgoing
            .push((MessageAction::AssignmentAckReceived, Message::AssignmentAck(ack)));
    }

    /// Reuse the assignment's current acknowledgement if it has one, else
    /// fabricate a fresh one; either way stamped with the current time and
    /// the given status.
    pub(crate) fn update_or_fabricate_ack(
        &self,
        assignment: &AssignmentMessage,
        status: AckStatus,
        reason: Option<&str>,
    ) -> AssignmentAckMessage {
        let mut ack = assignment.ack.clone().unwrap_or(AssignmentAckMessage {
            sender: self.own_id,
            ack_time: self.current_time,
            assigned_id: assignment.assigned_id,
            assigning_id: assignment.assigning_id,
            initiating_id: assignment.initiating_id,
            reference_track_id: assignment.reference_track_id,
            status,
            reason: None,
            systemic_scope: None,
            overriding_id: None,
            newly_assigned_id: None,
            updated_shot_doctrine: None,
            latent_process_time: None,
        });
        ack.sender = self.own_id;
        ack.ack_time = self.current_time;
        ack.status = status;
        if let Some(reason) = reason {
            ack.reason = Some(reason.to_string());
        }
        ack
    }

    // --- Own status ---

    /// Update own kinematics and status on the configured report cadence,
    /// refresh perceptions, and queue a status broadcast when either gate
    /// fires. The canonical per-tick self-report entry point.
    pub fn update_own_status(
        &mut self,
        time: f64,
        position_m: DVec3,
        velocity_ms: DVec3,
        external_status: SystemStatus,
    ) {
        self.current_time = time;

        let send_position = self.set_position(time, position_m, velocity_ms, false);
        // A position broadcast always carries a fresh status with it.
        let send_status = self.set_status(time, external_status, send_position);

        self.update_perceptions();

        if send_position || send_status {
            let msg = self.own_asset().map(AssetRecord::generate_status_message);
            if let Some(msg) = msg {
                self.queue_status(MessageAction::StatusReceived, msg);
            }
        }
    }

    /// Unconditionally store own kinematics. Returns whether it is time to
    /// broadcast: first-ever report, moved beyond the distance gate,
    /// exceeded the time gate, or forced.
    pub fn set_position(
        &mut self,
        time: f64,
        position_m: DVec3,
        velocity_ms: DVec3,
        force: bool,
    ) -> bool {
        let Some(own) = self.assets.get_mut(self.own_id) else {
            error!("set_position invoked but own asset record is missing");
            return false;
        };

        let last_position = own.position_m;
        let last_update_time = own.position_time;

        own.position_m = position_m;
        own.velocity_ms = velocity_ms;
        own.position_time = time;

        !self.status_initialized
            || position_m.distance(last_position) > self.config.report_position_every_meters
            || time - last_update_time >= self.config.report_position_every_seconds
            || force
    }

    /// Recompute own status on the report cadence. Returns whether a
    /// status broadcast is due.
    pub fn set_status(&mut self, time: f64, external_status: SystemStatus, force: bool) -> bool {
        let last_status_time = match self.own_asset() {
            Some(own) => own.status_time,
            None => {
                error!("set_status invoked but own asset record is missing");
                return false;
            }
        };

        if !self.status_initialized
            || time - last_status_time >= self.config.report_status_every_seconds
            || force
        {
            self.set_own_status(time, external_status);
            self.assets.update_subordinate_ages(self.own_id, time);
            true
        } else {
            false
        }
    }

    /// Evaluate every configured status check and set own system status:
    /// GREEN when all required checks pass, the weapon status itself when
    /// the weapon check is the only failure, RED otherwise. Any non-GREEN
    /// result kills all assignments with a reason naming the failures.
    fn set_own_status(&mut self, time: f64, external_status: SystemStatus) {
        let is_initialization = !self.status_initialized;
        if is_initialization {
            let (max_assignments, delay) =
                (self.config.max_assignments, self.config.assignment_delay_s);
            if let Some(own) = self.assets.get_mut(self.own_id) {
                own.max_assignments = max_assignments;
                own.current_assignments = 0;
                own.assignment_delay_s = delay;
            }
            self.status_initialized = true;
        }

        if let Some(own) = self.assets.get_mut(self.own_id) {
            own.status_time = time;
        }

        let aggregate = self.config.aggregate_unit_status;
        let weapon_status = if self.config.weapon_required {
            self.assets
                .weapon_status(self.own_id, aggregate, self.config.require_all_weapons)
        } else {
            SystemStatus::Green
        };

        let mut failures: Vec<String> = Vec::new();
        let mut weapon_failed = false;
        {
            let Some(own) = self.own_asset() else {
                error!("set_own_status invoked but own asset record is missing");
                return;
            };

            if own.c2_status() != SystemStatus::Green {
                failures.push("C2 failure".into());
            }
            if self.config.weapon_required && weapon_status != SystemStatus::Green {
                failures.push("weapon failure".into());
                weapon_failed = true;
            }
            if self.config.ew_required
                && self.assets.sensor_status(self.own_id, SensorKind::Ew, aggregate)
                    != SystemStatus::Green
            {
                failures.push("EW failure".into());
            }
            if self.config.tar_required
                && self.assets.sensor_status(self.own_id, SensorKind::Tar, aggregate)
                    != SystemStatus::Green
            {
                failures.push("TAR failure".into());
            }
            if self.config.ttr_required
                && self.assets.sensor_status(self.own_id, SensorKind::Ttr, aggregate)
                    != SystemStatus::Green
            {
                failures.push("TTR failure".into());
            }
            if self.config.stationary_ops_only
                && !is_initialization
                && own.stationary_status() != SystemStatus::Green
            {
                failures.push("non-stationary failure".into());
            }
            if external_status != SystemStatus::Green {
                failures.push(format!("externally-defined failure ({external_status:?})"));
            }
        }

        let new_status = if failures.is_empty() {
            SystemStatus::Green
        } else if failures.len() == 1 && weapon_failed {
            // Out of munitions but otherwise healthy reports WHITE.
            weapon_status
        } else {
            SystemStatus::Red
        };

        if let Some(own) = self.assets.get_mut(self.own_id) {
            own.system_status = new_status;
        }

        if new_status != SystemStatus::Green {
            let reasons = failures.join(", ");
            warn!(
                status = ?new_status,
                %reasons,
                "own status check failed"
            );
            self.kill_all_assignments(&format!("internal {new_status:?} status: {reasons}"));
        }
    }
}
