//! Inbound message processing.
//!
//! One handler per protocol message kind, dispatched from
//! [`AssetManager::process_message`]. Invalid or unknown references are
//! logged and dropped without state changes; conflicts answer with CANTCO
//! instead of failing.

use tracing::{debug, error, trace, warn};

use aegis_core::enums::{AckStatus, AssignReason, CantcoScope, ShotDoctrine};
use aegis_core::messages::{
    AssignmentAckMessage, AssignmentMessage, AssignmentTrackMessage, CombatStatusMessage,
    CueMessage, Message, TrackUpdateMessage,
};
use aegis_core::{ChainAdjust, Id, TrackRecord};

use crate::manager::{AssetManager, MessageAction};

impl AssetManager {
    /// Apply one inbound message to this node's state.
    pub fn process_message(&mut self, msg: &Message) {
        match msg {
            Message::TrackUpdate(m) => self.process_track_update(m),
            Message::CombatStatus(m) => self.process_combat_status(m),
            Message::Assignment(m) => self.process_assignment_directive(m),
            Message::AssignmentAck(m) => self.process_ack(m),
            Message::AssignmentTrack(m) => self.process_assignment_track(m),
            Message::Cue(m) => self.process_cue(m),
            Message::Plot(m) => {
                trace!(time = self.current_time, sender = %m.sender, "plot message: ignoring");
            }
            Message::BearingReport(m) => {
                trace!(time = self.current_time, sender = %m.sender, "bearing report: ignoring");
            }
            Message::WeaponsControl(m) => {
                trace!(time = self.current_time, sender = %m.sender, "weapons control: ignoring");
            }
        }
    }

    pub fn process_track_update(&mut self, msg: &TrackUpdateMessage) {
        trace!(
            time = self.current_time,
            track = %msg.track_id,
            status = ?msg.status,
            "track update"
        );

        if !msg.track_id.is_valid() {
            error!(track = %msg.track_id, "invalid track id not allowed");
            return;
        }

        if msg.status.is_update() {
            self.upsert_master_track(msg);
            self.push_outgoing(
                MessageAction::UpdatedTrack,
                Message::TrackUpdate(msg.clone()),
            );
        } else if self.delete_master_track(msg.track_id) {
            debug!(track = %msg.track_id, name = %msg.truth_name, "dropped track");
            self.push_outgoing(
                MessageAction::DroppedTrack,
                Message::TrackUpdate(msg.clone()),
            );
        }
    }

    fn upsert_master_track(&mut self, msg: &TrackUpdateMessage) {
        match self.master_tracks.get_mut(&msg.track_id) {
            Some(track) => track.absorb_update(msg),
            None => {
                self.master_tracks
                    .insert(msg.track_id, TrackRecord::from_update(msg));
            }
        }

        // Sensor processors (ongoing cues) want fresh kinematics.
        if let Some(sm) = self.sensor_manager.as_deref_mut() {
            if let Some(track) = self.master_tracks.get(&msg.track_id) {
                sm.master_track_updated(self.current_time, track);
            }
        }

        // Assignments prosecuted elsewhere need the refreshed track too.
        let snapshots: Vec<AssignmentTrackMessage> = {
            let Some(track) = self.master_tracks.get(&msg.track_id) else {
                return;
            };
            let own_id = self.own_id;
            self.ledger
                .on_track(msg.track_id)
                .iter()
                .filter(|ea| !ea.assignment.assigned_id.same_unit(&own_id))
                .map(|ea| AssignmentTrackMessage {
                    sender: own_id,
                    assigned_unit_id: ea.assignment.assigned_id,
                    track: track.clone(),
                    latent_process_time: None,
                })
                .collect()
        };
        for snapshot in snapshots {
            self.push_outgoing(
                MessageAction::AssignmentTrackUpdate,
                Message::AssignmentTrack(snapshot),
            );
        }
    }

    /// Remove a master track along with its exclusion entries. Returns
    /// whether a track was actually removed.
    pub(crate) fn delete_master_track(&mut self, track_id: Id) -> bool {
        let erased = self.master_tracks.remove(&track_id).is_some();
        if erased {
            self.exclusions.remove_track(track_id);
        }
        erased
    }

    pub fn process_combat_status(&mut self, msg: &CombatStatusMessage) {
        trace!(
            time = self.current_time,
            asset = %msg.asset_id,
            "combat status"
        );

        if !self.assets.contains(msg.asset_id) {
            warn!(
                asset = %msg.asset_id,
                sender = %msg.sender,
                "combat status for unknown asset"
            );
            return;
        }

        let has_assignments = self.unit_has_assignments(msg.asset_id, false);
        if let Some(asset) = self.assets.get_mut(msg.asset_id) {
            asset.absorb_status(msg, has_assignments);
        }
        self.queue_status(MessageAction::StatusReceived, msg.clone());
    }

    pub fn process_assignment_directive(&mut self, msg: &AssignmentMessage) {
        trace!(
            time = self.current_time,
            sender = %msg.sender,
            reference = %msg.reference_track_id,
            local = %msg.local_track_id,
            reason = ?msg.reason,
            "assignment directive"
        );

        match msg.reason {
            AssignReason::New | AssignReason::Retransmit | AssignReason::Update => {
                self.handle_create_assignment(msg);
            }
            AssignReason::Reassignment => {
                error!("assignment reassign directives are not supported");
            }
            AssignReason::Cancel => self.handle_cancel_assignment(msg),
        }
    }

    /// Delegation intake for NEW/RETRANSMIT/UPDATE directives: validate,
    /// then buffer for the next evaluation cycle. Every rejection answers
    /// with a CANTCO.
    fn handle_create_assignment(&mut self, msg: &AssignmentMessage) {
        if self.has_commit_authority() {
            warn!("received create assignment on commit authority platform; unsupported");
            self.cantco_directive(
                msg,
                "no authority - receiving platform has commit",
                Some(CantcoScope::Global),
            );
            return;
        }

        if !self.master_tracks.contains_key(&msg.local_track_id) {
            self.cantco_directive(msg, "no master track", None);
            return;
        }

        if let Some(existing_assigning) = self
            .ledger
            .get(msg.local_track_id, msg.assigned_id)
            .map(|ea| ea.assignment.assigning_id)
        {
            error!(
                assigned = %msg.assigned_id,
                track = %msg.local_track_id,
                "already prosecuting assignment; ignoring directive"
            );
            if existing_assigning != msg.assigning_id {
                error!("assignment is conflicting; sending CANTCO rejection to sender");
                self.cantco_directive(msg, "already prosecuting assignment", None);
            }
            return;
        }

        if self.ledger.is_track_assigned(msg.local_track_id) {
            error!(
                assigned = %msg.assigned_id,
                track = %msg.local_track_id,
                "track already carries an assignment; conflicting directive"
            );
            self.cantco_directive(msg, "already prosecuting assignment", None);
            return;
        }

        let engageable = match (
            self.battle_manager.as_deref(),
            self.master_tracks.get(&msg.local_track_id),
        ) {
            (Some(bm), Some(track)) => bm.is_track_engageable(track),
            _ => true,
        };
        if !engageable {
            self.cantco_directive(
                msg,
                "battle manager settings do not allow engagement of track",
                Some(CantcoScope::Local),
            );
            return;
        }

        // One outstanding delegation per track.
        if self.pending_delegations.contains_key(&msg.local_track_id) {
            self.cantco_directive(
                msg,
                "delegation assignment already pending",
                Some(CantcoScope::Local),
            );
        } else {
            self.pending_delegations.insert(msg.local_track_id, msg.clone());
            debug!(
                track = %msg.local_track_id,
                assigned = %msg.assigned_id,
                assigning = %msg.assigning_id,
                "buffered delegation assignment"
            );
        }
    }

    fn handle_cancel_assignment(&mut self, msg: &AssignmentMessage) {
        let existing = self.ledger.get(msg.local_track_id, msg.assigned_id).map(|ea| {
            (
                ea.assignment.is_complete(),
                ea.assignment.uncommitted_missiles(),
            )
        });

        match existing {
            Some((false, credit_missiles)) => {
                if let Some(entry) = self.ledger.get_mut(msg.local_track_id, msg.assigned_id) {
                    entry.assignment.reason = msg.reason;
                }
                self.assets.adjust_chain(
                    self.own_id,
                    msg.assigned_id,
                    ChainAdjust::Credit,
                    1,
                    credit_missiles as i32,
                );

                if !msg.assigned_id.same_unit(&self.own_id) {
                    self.queue_assignment(MessageAction::CancelAssignmentReceived, msg.clone());
                } else {
                    debug!(
                        time = self.current_time,
                        track = %msg.local_track_id,
                        weapon = %msg.assigned_id,
                        "processed assignment cancel"
                    );
                }
            }
            Some((true, _)) => {
                warn!("received assignment cancellation but assignment is already complete");
            }
            None => {
                warn!("received assignment cancellation but no matching assignment exists");
            }
        }
    }

    pub fn process_ack(&mut self, msg: &AssignmentAckMessage) {
        trace!(
            time = self.current_time,
            sender = %msg.sender,
            reference = %msg.reference_track_id,
            status = ?msg.status,
            "assignment ack"
        );

        let Some((key, idx)) = self.ledger.resolve_ack(msg) else {
            error!("received assignment status but could not resolve assignment");
            return;
        };
        let Some(assignment) = self.ledger.entry(key, idx).map(|ea| ea.assignment.clone()) else {
            return;
        };

        match msg.status {
            AckStatus::Wilco
            | AckStatus::Committed
            | AckStatus::CueTar
            | AckStatus::CueTtr
            | AckStatus::TarSearching
            | AckStatus::TtrSearching
            | AckStatus::TarTracking
            | AckStatus::TtrTracking
            | AckStatus::Firing
            | AckStatus::Miss => {
                if let Some(entry) = self.ledger.entry_mut(key, idx) {
                    entry.assignment.ack = Some(msg.clone());
                }
            }

            AckStatus::ChangedAssignedUnit => {
                let (Some(newly_assigned), Some(overriding)) =
                    (msg.newly_assigned_id, msg.overriding_id)
                else {
                    error!("CHANGED_ASSIGNED_UNIT ack without override identities");
                    return;
                };
                // The original assignee gets its resources back; the new
                // one is debited the full doctrine commitment since its
                // engagement has not happened yet.
                self.assets.adjust_chain(
                    self.own_id,
                    assignment.assigned_id,
                    ChainAdjust::Credit,
                    1,
                    assignment.uncommitted_missiles() as i32,
                );
                self.assets.adjust_chain(
                    self.own_id,
                    newly_assigned,
                    ChainAdjust::Debit,
                    1,
                    assignment.requested_missiles_to_commit as i32,
                );
                if let Some(entry) = self.ledger.entry_mut(key, idx) {
                    entry.assignment.assigned_id = newly_assigned;
                    entry.assignment.assigning_id = overriding;
                    // The initiating unit never changes.
                    entry.assignment.ack = Some(msg.clone());
                }
            }

            AckStatus::UpdatedShotDoctrine => {
                let Some(new_doctrine) = msg.updated_shot_doctrine else {
                    error!("UPDATED_SHOT_DOCTRINE ack without a doctrine");
                    return;
                };
                let delta = ShotDoctrine::difference(new_doctrine, assignment.shot_doctrine);
                if delta != 0 {
                    debug!(delta, "updating perceived munitions for shot doctrine change");
                    self.assets.adjust_chain(
                        self.own_id,
                        assignment.assigned_id,
                        ChainAdjust::Debit,
                        0,
                        delta,
                    );
                }
                if let Some(entry) = self.ledger.entry_mut(key, idx) {
                    entry.assignment.shot_doctrine = new_doctrine;
                    entry.assignment.requested_missiles_to_commit = new_doctrine.missile_count();
                    entry.assignment.ack = Some(msg.clone());
                }
            }

            AckStatus::Kill
            | AckStatus::Cancelled
            | AckStatus::HavcoSuccess
            | AckStatus::HavcoFailure
            | AckStatus::Cantco => {
                // Closing status: release resources exactly once.
                if !assignment.is_complete() {
                    self.assets.adjust_chain(
                        self.own_id,
                        assignment.assigned_id,
                        ChainAdjust::Credit,
                        1,
                        assignment.uncommitted_missiles() as i32,
                    );
                    if let Some(entry) = self.ledger.entry_mut(key, idx) {
                        entry.assignment.ack = Some(msg.clone());
                    }
                }
            }
        }

        if msg.is_systemic_cantco() {
            self.exclusions.add_from_ack(msg);
        }

        // Relay progress upstream unless the decision originated here.
        if !msg.initiating_id.same_unit(&self.own_id) {
            self.queue_ack(msg.clone());
        }
    }

    /// Track snapshots accompany directives so the assignee can prosecute
    /// targets it holds no track on; adopt the track if it is for us,
    /// forward otherwise.
    pub fn process_assignment_track(&mut self, msg: &AssignmentTrackMessage) {
        if msg.assigned_unit_id.same_unit(&self.own_id) {
            trace!(
                time = self.current_time,
                track = %msg.track.id,
                "adopting assignment track snapshot"
            );
            self.master_tracks.insert(msg.track.id, msg.track.clone());
        } else {
            self.push_outgoing(
                MessageAction::AssignmentTrackUpdate,
                Message::AssignmentTrack(msg.clone()),
            );
        }
    }

    pub fn process_cue(&mut self, msg: &CueMessage) {
        trace!(
            time = self.current_time,
            sender = %msg.sender,
            reference = %msg.reference_track_id,
            "cue message"
        );

        if msg.cued_unit_id.same_unit(&self.own_id) {
            self.handle_incoming_cue(msg);
        } else {
            self.push_outgoing(MessageAction::SensorCue, Message::Cue(msg.clone()));
        }
    }

    fn handle_incoming_cue(&mut self, msg: &CueMessage) {
        let cueable = match self
            .own_asset()
            .and_then(|own| own.sensor(msg.cued_sensor_id))
        {
            Some(sensor) => sensor.cueable,
            None => {
                error!(sensor = %msg.cued_sensor_id, "received cue for non-existent sensor");
                return;
            }
        };

        // Cueable (TTR-class) sensors need a track to lock onto.
        if cueable && !self.master_tracks.contains_key(&msg.local_track_id) {
            error!(
                reference = %msg.reference_track_id,
                "received cue but could not resolve local track for sensor"
            );
            return;
        }

        if let Some(sm) = self.sensor_manager.as_deref_mut() {
            sm.handle_cue(
                self.current_time,
                self.master_tracks.get(&msg.local_track_id),
                msg,
            );
        }
    }

    /// True when the unit (a weapon platform: direct comparison; a C2
    /// node: any subordinate) carries an assignment in the ledger.
    pub fn unit_has_assignments(&self, asset_id: Id, compare_sub_id: bool) -> bool {
        let Some(unit) = self.assets.get(asset_id) else {
            error!(asset = %asset_id, "unit_has_assignments: invalid asset id");
            return false;
        };

        if unit.has_weapon() {
            self.ledger.iter().any(|ea| {
                if compare_sub_id {
                    ea.assignment.assigned_id == asset_id
                } else {
                    ea.assignment.assigned_id.same_unit(&asset_id)
                }
            })
        } else if unit.c2_capable {
            self.ledger
                .iter()
                .any(|ea| self.assets.is_subordinate(asset_id, ea.assignment.assigned_id))
        } else {
            false
        }
    }
}
