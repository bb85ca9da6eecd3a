//! Assignment lifecycle: evaluation staging, promotion, monitoring,
//! completion, and internally generated status transitions.
//!
//! The per-tick order is a correctness requirement, not a convention:
//! inbound messages first, then prepare → evaluate → create → monitor →
//! complete, then the host drains the outgoing queue.

use tracing::{debug, error, warn};

use aegis_core::enums::{AckStatus, AssignReason, CantcoScope, SensorKind};
use aegis_core::messages::{AssignmentMessage, Message};
use aegis_core::{ChainAdjust, Id};

use crate::battle_manager::{EvaluatedAssignment, EvaluationTrack};
use crate::manager::{AssetManager, MessageAction};

impl AssetManager {
    /// Run one full decision cycle in the canonical order.
    pub fn run_decision_cycle(&mut self) {
        // 1. Offer candidate tracks to the battle manager
        self.prepare_tracks_for_evaluation();
        // 2. Pair tracks with weapons (external heuristic)
        self.evaluate();
        // 3. Promote evaluated candidates into live assignments
        self.create_assignments();
        // 4. Cancel assignments that can no longer proceed
        self.monitor_assignments();
        // 5. Clear closed assignments from the ledger
        self.complete_assignments();
    }

    /// Rebuild the battle manager's working set for this cycle. With
    /// commit authority, every engageable unassigned master track is a
    /// candidate; without it, only tracks with a pending delegated
    /// directive are. Excluded tracks are never offered.
    pub fn prepare_tracks_for_evaluation(&mut self) {
        let Some(mut bm) = self.battle_manager.take() else {
            return;
        };

        bm.clear_evaluation_tracks();

        if bm.has_commit_authority() {
            for track in self.master_tracks.values() {
                if self.exclusions.is_excluded(track.id) {
                    continue;
                }
                if bm.is_track_engageable(track) && !self.ledger.is_track_assigned(track.id) {
                    bm.add_track_for_evaluation(EvaluationTrack::new(track.clone()));
                }
            }
        } else {
            for (track_id, directive) in &self.pending_delegations {
                let Some(track) = self.master_tracks.get(track_id) else {
                    continue;
                };
                if self.exclusions.is_excluded(*track_id) {
                    continue;
                }
                if bm.is_track_engageable(track)
                    && self
                        .ledger
                        .get(directive.local_track_id, directive.assigned_id)
                        .is_none()
                {
                    bm.add_track_for_evaluation(EvaluationTrack::delegated(
                        track.clone(),
                        directive.clone(),
                    ));
                }
            }
        }

        self.battle_manager = Some(bm);
    }

    /// Invoke the battle manager's pairing heuristic over the offered
    /// tracks.
    pub fn evaluate(&mut self) {
        if let Some(mut bm) = self.battle_manager.take() {
            bm.evaluate(&self.assets, self.current_time);
            self.battle_manager = Some(bm);
        }
    }

    /// Promote evaluated candidates into the ledger, debit the C2 chain,
    /// and queue the directives (with paired track snapshots) for
    /// dissemination. Without a battle manager, pending delegations pass
    /// straight through unchanged.
    pub fn create_assignments(&mut self) {
        let evaluated: Vec<EvaluatedAssignment> = if self.battle_manager.is_some() {
            self.battle_manager
                .as_mut()
                .map(|bm| bm.take_evaluated_assignments())
                .unwrap_or_default()
        } else {
            let pending: Vec<AssignmentMessage> =
                self.pending_delegations.values().cloned().collect();
            let mut passed_through = Vec::new();
            for directive in pending {
                match self.master_tracks.get(&directive.local_track_id) {
                    Some(track) => passed_through.push(EvaluatedAssignment::new(
                        EvaluationTrack::delegated(track.clone(), directive.clone()),
                        directive,
                    )),
                    None => error!(
                        track = %directive.local_track_id,
                        "cannot propagate pending assignment: no master track"
                    ),
                }
            }
            passed_through
        };

        for evaled in evaluated {
            self.log_assignment_creation(&evaled);

            if evaled.is_overridden {
                if let Some(notice) = self.override_notification(&evaled) {
                    self.push_outgoing(
                        MessageAction::AssignmentOverrideNotification,
                        Message::AssignmentAck(notice),
                    );
                }
            }
            if evaled.is_doctrine_updated {
                let notice = self.doctrine_notification(&evaled);
                self.push_outgoing(
                    MessageAction::AssignmentOverrideNotification,
                    Message::AssignmentAck(notice),
                );
            }

            let assignment = evaled.assignment.clone();
            self.assets.adjust_chain(
                self.own_id,
                assignment.assigned_id,
                ChainAdjust::Debit,
                1,
                assignment.requested_missiles_to_commit as i32,
            );
            self.ledger.insert(evaled);

            if !assignment.assigned_id.same_unit(&self.own_id) {
                debug!(
                    assigned = %assignment.assigned_id,
                    "assignment destination is not us; queueing for dissemination"
                );
                self.queue_assignment(MessageAction::AssignmentMessageOut, assignment);
            } else {
                debug!(assigned = %assignment.assigned_id, "assignment destination is us");
            }
        }
    }

    /// Promote a self-defense engagement decided outside the normal
    /// evaluation cycle.
    pub fn create_self_defense_assignment(&mut self, evaled: EvaluatedAssignment) {
        let directive = evaled.assignment.clone();
        self.assets.adjust_chain(
            self.own_id,
            directive.assigned_id,
            ChainAdjust::Debit,
            1,
            directive.requested_missiles_to_commit as i32,
        );
        self.ledger.insert(evaled);
        self.push_outgoing(
            MessageAction::SelfDefenseAssignmentCreated,
            Message::Assignment(directive),
        );
    }

    fn log_assignment_creation(&mut self, evaled: &EvaluatedAssignment) {
        let assigned = evaled.assignment.assigned_id;
        let commanded = assigned.same_unit(&self.own_id)
            || self
                .own_asset()
                .is_some_and(|own| own.is_direct_subordinate(assigned));
        let flag = if commanded { "COMMANDED" } else { "DELEGATE" };
        self.moe.assignment(self.current_time, evaled, flag);
    }

    fn override_notification(
        &self,
        evaled: &EvaluatedAssignment,
    ) -> Option<aegis_core::messages::AssignmentAckMessage> {
        let delegate = evaled.delegate()?;
        let mut ack = self.update_or_fabricate_ack(
            &evaled.assignment,
            AckStatus::ChangedAssignedUnit,
            None,
        );
        ack.assigned_id = delegate.assigned_id;
        ack.overriding_id = Some(evaled.assignment.initiating_id);
        ack.newly_assigned_id = Some(evaled.assignment.assigned_id);
        Some(ack)
    }

    fn doctrine_notification(
        &self,
        evaled: &EvaluatedAssignment,
    ) -> aegis_core::messages::AssignmentAckMessage {
        let mut ack = self.update_or_fabricate_ack(
            &evaled.assignment,
            AckStatus::UpdatedShotDoctrine,
            None,
        );
        ack.updated_shot_doctrine = Some(evaled.assignment.shot_doctrine);
        ack
    }

    /// Cancel every assignment this node authored that can no longer
    /// proceed: its master track vanished, its shot clock expired, or a
    /// node on the assigning→assigned command path went RED. The battle
    /// manager's own monitor hook runs first.
    pub fn monitor_assignments(&mut self) {
        if let Some(mut bm) = self.battle_manager.take() {
            bm.run_monitor_assignments(self.current_time);
            self.battle_manager = Some(bm);
        }

        let mut to_cancel: Vec<(Id, Id, &'static str)> = Vec::new();
        for ea in self.ledger.iter() {
            let assignment = &ea.assignment;
            if !assignment.assigning_id.same_unit(&self.own_id) || assignment.is_complete() {
                continue;
            }

            if !self.master_tracks.contains_key(&ea.track_id()) {
                to_cancel.push((ea.track_id(), assignment.assigned_id, "no master track"));
            } else if self.current_time - assignment.assign_time > assignment.max_firing_time_s {
                to_cancel.push((ea.track_id(), assignment.assigned_id, "shot expired"));
            } else if self
                .assets
                .is_chain_red(assignment.assigning_id, assignment.assigned_id)
            {
                to_cancel.push((ea.track_id(), assignment.assigned_id, "command chain went red"));
            }
        }

        for (track, assigned, reason) in to_cancel {
            debug!(
                time = self.current_time,
                %track,
                %assigned,
                reason,
                "monitor cancelling assignment"
            );
            self.cancel_assignment(track, assigned, reason);
        }
    }

    /// Remove every closed assignment from the ledger; a successful
    /// outcome also deletes the master track. The pending-delegation set
    /// has been fully consumed by this point and is cleared.
    pub fn complete_assignments(&mut self) {
        for removed in self.ledger.remove_completed() {
            if removed.assignment.was_success() {
                debug!(
                    track = %removed.assignment.local_track_id,
                    "assignment complete and successful; erasing master track"
                );
                self.delete_master_track(removed.assignment.local_track_id);
            } else {
                debug!(
                    track = %removed.assignment.local_track_id,
                    assigned = %removed.assignment.assigned_id,
                    "assignment complete but not successful; keeping track"
                );
            }
        }

        self.pending_delegations.clear();
    }

    /// CANTCO then cancel every open assignment. Used when this node's own
    /// status degrades below GREEN.
    pub fn kill_all_assignments(&mut self, reason: &str) {
        let open: Vec<(Id, Id)> = self
            .ledger
            .iter()
            .filter(|ea| !ea.assignment.is_complete())
            .map(|ea| (ea.track_id(), ea.assignment.assigned_id))
            .collect();

        for (track, assigned) in open {
            self.cantco_active_assignment(track, assigned, reason);
            self.cancel_assignment(track, assigned, reason);
        }
    }

    /// Cancel one ledger assignment. Self-assigned engagements are closed
    /// directly with a CANCELLED acknowledgement; remote ones get a CANCEL
    /// directive and an immediate resource credit, with the ledger entry
    /// surviving until the terminal acknowledgement arrives.
    pub(crate) fn cancel_assignment(&mut self, track: Id, assigned: Id, reason: &str) {
        let Some(entry) = self.ledger.get(track, assigned) else {
            warn!(%track, %assigned, "cancel requested for unknown assignment");
            return;
        };
        let assignment = entry.assignment.clone();
        self.moe
            .assignment_cancel(self.current_time, self.own_id, entry, reason);

        if assignment.assigned_id.same_unit(&self.own_id) {
            let ack = self.update_or_fabricate_ack(&assignment, AckStatus::Cancelled, Some(reason));
            if let Some(entry) = self.ledger.get_mut(track, assigned) {
                entry.assignment.ack = Some(ack.clone());
            }
            self.queue_ack(ack);
        } else {
            let mut directive = assignment.clone();
            directive.sender = self.own_id;
            directive.reason = AssignReason::Cancel;
            if let Some(entry) = self.ledger.get_mut(track, assigned) {
                entry.assignment.reason = AssignReason::Cancel;
            }
            self.assets.adjust_chain(
                self.own_id,
                assignment.assigned_id,
                ChainAdjust::Credit,
                1,
                assignment.uncommitted_missiles() as i32,
            );
            self.queue_assignment(MessageAction::AssignmentMessageOut, directive);
        }
    }

    /// Mark an active assignment CANTCO: MOE log, status update, ack out.
    /// Resource release is left to the cancel that follows.
    fn cantco_active_assignment(&mut self, track: Id, assigned: Id, reason: &str) {
        let Some(entry) = self.ledger.get(track, assigned) else {
            return;
        };
        let assignment = entry.assignment.clone();
        let track_record = self.master_tracks.get(&track).cloned();
        self.moe.cantco_assignment(
            self.current_time,
            self.own_id,
            &assignment,
            track_record.as_ref(),
            reason,
        );

        let ack = self.update_or_fabricate_ack(&assignment, AckStatus::Cantco, Some(reason));
        if let Some(entry) = self.ledger.get_mut(track, assigned) {
            entry.assignment.ack = Some(ack.clone());
        }
        self.queue_ack(ack);
    }

    /// Refuse an inbound directive with a CANTCO acknowledgement. Systemic
    /// refusals also populate the exclusion table. Never touches the
    /// ledger: rejecting a directive must not kill an assignment this node
    /// already prosecutes.
    pub(crate) fn cantco_directive(
        &mut self,
        directive: &AssignmentMessage,
        reason: &str,
        scope: Option<CantcoScope>,
    ) {
        let track_record = self.master_tracks.get(&directive.local_track_id).cloned();
        self.moe.cantco_assignment(
            self.current_time,
            self.own_id,
            directive,
            track_record.as_ref(),
            reason,
        );

        let mut ack = self.update_or_fabricate_ack(directive, AckStatus::Cantco, Some(reason));
        if let Some(scope) = scope {
            ack.systemic_scope = Some(scope);
            debug!(
                track = %ack.reference_track_id,
                ?scope,
                "systemic CANTCO; adding reference track to exclusion table"
            );
            self.exclusions.add_from_ack(&ack);
        }
        self.queue_ack(ack);
    }

    /// Recompute own perception: the in-flight assignment count from the
    /// ledger, and weapon counters snapped to truth for every weapon not
    /// carrying an assignment tracked by an on-platform battle manager
    /// (those are left to the battle manager's own estimates).
    pub fn update_perceptions(&mut self) {
        let incomplete = self.ledger.count_incomplete() as u32;
        let has_battle_manager = self.battle_manager.is_some();

        let busy: Vec<u32> = match self.own_asset() {
            Some(own) => own
                .weapons
                .iter()
                .map(|w| w.weapon_id)
                .filter(|w| has_battle_manager && self.ledger.weapon_has_assignments(*w))
                .collect(),
            None => return,
        };

        if let Some(own) = self.assets.get_mut(self.own_id) {
            own.current_assignments = incomplete;
            for weapon in &mut own.weapons {
                if !busy.contains(&weapon.weapon_id) {
                    weapon.refresh_perception();
                }
            }
        }
    }

    // --- Internally generated status transitions, used by on-platform
    // weapon and sensor models ---

    pub fn wilco_assignment(&mut self, track: Id, assigned: Id) {
        let Some(ack) = self.internally_update_status(track, assigned, AckStatus::Wilco) else {
            return;
        };
        if let Some(entry) = self.ledger.get(track, assigned) {
            self.moe.wilco_assignment(self.current_time, &ack, entry);
        }
    }

    pub fn havco_assignment(&mut self, track: Id, assigned: Id, was_success: bool) {
        let status = if was_success {
            AckStatus::HavcoSuccess
        } else {
            AckStatus::HavcoFailure
        };
        let Some(ack) = self.internally_update_status(track, assigned, status) else {
            return;
        };
        if let Some(entry) = self.ledger.get(track, assigned) {
            self.moe.havco_assignment(self.current_time, &ack, entry);
        }
    }

    /// Report a shot against an assignment. Shots are tallied on the
    /// assignment unless this node is its assigner (the assigner learns of
    /// them through the relayed acknowledgement instead).
    pub fn report_shots_fired(&mut self, track: Id, assigned: Id) {
        let Some(ack) = self.internally_update_status(track, assigned, AckStatus::Firing) else {
            return;
        };
        if let Some(entry) = self.ledger.get_mut(track, assigned) {
            if !entry.assignment.assigning_id.same_unit(&self.own_id) {
                entry.assignment.shots_fired += 1;
            }
        }
        if let Some(entry) = self.ledger.get(track, assigned) {
            self.moe.assignment_status(self.current_time, &ack, entry);
        }
    }

    /// Report a TAR/TTR lock in support of an assignment.
    pub fn report_sensor_tracking(&mut self, track: Id, assigned: Id, kind: SensorKind) {
        let status = match kind {
            SensorKind::Tar => AckStatus::TarTracking,
            SensorKind::Ttr => AckStatus::TtrTracking,
            _ => {
                error!(?kind, "attempted to record sensor tracking but sensor not TAR or TTR");
                return;
            }
        };
        if self
            .internally_update_status(track, assigned, status)
            .is_none()
        {
            return;
        }
        self.moe
            .sensor_tracking(self.current_time, self.master_tracks.get(&track), kind);
    }

    /// Update-or-fabricate the assignment's acknowledgement with a new
    /// status, store it, queue it, and refresh perceptions if it closed
    /// the assignment.
    fn internally_update_status(
        &mut self,
        track: Id,
        assigned: Id,
        status: AckStatus,
    ) -> Option<aegis_core::messages::AssignmentAckMessage> {
        let assignment = match self.ledger.get(track, assigned) {
            Some(entry) => entry.assignment.clone(),
            None => {
                error!(%track, %assigned, "status update for unknown assignment");
                return None;
            }
        };

        let ack = self.update_or_fabricate_ack(&assignment, status, None);
        if let Some(entry) = self.ledger.get_mut(track, assigned) {
            entry.assignment.ack = Some(ack.clone());
        }
        self.queue_ack(ack.clone());

        if ack.status.closes_assignment() {
            self.update_perceptions();
        }
        Some(ack)
    }
}
