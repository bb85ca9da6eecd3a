//! Asset records and the command-hierarchy table.
//!
//! Each asset manager owns one [`AssetMap`] describing its perception of
//! every node in the command web. Records reference each other only by
//! [`Id`]; there is no ownership between assets. Records are never deleted
//! during a run, only aged out to YELLOW/RED when their status reports go
//! stale.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::*;
use crate::enums::{SensorKind, SystemStatus};
use crate::id::Id;
use crate::messages::{CombatStatusMessage, WeaponSystemStatus};

/// Direction of a C2-chain resource adjustment.
///
/// Debit consumes capacity (an assignment was created: in-flight count up,
/// perceived munitions down); credit releases it (an assignment ended:
/// count down, unexpended munitions restored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAdjust {
    Debit,
    Credit,
}

fn add_signed(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

/// One weapon on an asset, with truth counters (maintained by the host
/// simulation) and this node's perceived counters (maintained by
/// assignment bookkeeping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRecord {
    /// Sub-system id of this weapon on its parent asset.
    pub weapon_id: u32,
    pub total_munitions: u32,
    pub munitions_prepped: u32,
    pub total_fire_channels: u32,

    // Perceived counters. These drift from truth while assignments are in
    // flight and are snapped back by perception refreshes.
    pub estimated_total_munitions: u32,
    pub estimated_munitions_prepped: u32,
    pub estimated_allocated_fire_channels: u32,
}

impl WeaponRecord {
    pub fn new(weapon_id: u32, munitions: u32, fire_channels: u32) -> Self {
        Self {
            weapon_id,
            total_munitions: munitions,
            munitions_prepped: munitions,
            total_fire_channels: fire_channels,
            estimated_total_munitions: munitions,
            estimated_munitions_prepped: munitions,
            estimated_allocated_fire_channels: 0,
        }
    }

    /// Apply an assignment-driven adjustment to the perceived counters.
    pub fn adjust(&mut self, adjust: ChainAdjust, fire_channels: u32, munitions: i32) {
        match adjust {
            ChainAdjust::Debit => {
                self.estimated_allocated_fire_channels = self
                    .estimated_allocated_fire_channels
                    .saturating_add(fire_channels);
                self.estimated_munitions_prepped =
                    add_signed(self.estimated_munitions_prepped, -munitions);
            }
            ChainAdjust::Credit => {
                self.estimated_allocated_fire_channels = self
                    .estimated_allocated_fire_channels
                    .saturating_sub(fire_channels);
                self.estimated_munitions_prepped =
                    add_signed(self.estimated_munitions_prepped, munitions);
            }
        }
    }

    /// Snap perceived counters back to truth.
    pub fn refresh_perception(&mut self) {
        self.estimated_total_munitions = self.total_munitions;
        self.estimated_munitions_prepped = self.munitions_prepped;
        self.estimated_allocated_fire_channels = 0;
    }

    pub fn has_ready_munitions(&self) -> bool {
        self.estimated_munitions_prepped > 0
    }

    pub fn status_report(&self) -> WeaponSystemStatus {
        WeaponSystemStatus {
            weapon_id: self.weapon_id,
            munitions_ready: self.estimated_munitions_prepped,
            total_munitions: self.estimated_total_munitions,
            total_fire_channels: self.total_fire_channels,
            allocated_fire_channels: self.estimated_allocated_fire_channels,
        }
    }
}

/// One sensor on an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub sensor_id: Id,
    pub kind: SensorKind,
    /// Cueable sensors (TTR class) require a master track before accepting
    /// a cue.
    pub cueable: bool,
}

/// This node's perception of one asset in the command hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: Id,
    pub name: String,
    pub side: String,
    pub unit_type: String,

    pub position_m: DVec3,
    pub velocity_ms: DVec3,
    pub position_time: f64,
    pub status_time: f64,
    pub system_status: SystemStatus,

    /// Whether this asset can command others.
    pub c2_capable: bool,
    pub commander: Option<Id>,
    pub subordinates: Vec<Id>,
    pub peers: Vec<Id>,

    pub weapons: Vec<WeaponRecord>,
    pub sensors: Vec<SensorRecord>,

    pub max_assignments: u32,
    /// In-flight (non-terminal) assignments this asset is prosecuting, as
    /// perceived by this node.
    pub current_assignments: u32,
    /// Simulated decision latency this asset adds when it issues
    /// assignments (seconds).
    pub assignment_delay_s: f64,

    pub yellow_ageout_s: f64,
    pub red_ageout_s: f64,
}

impl AssetRecord {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            side: String::new(),
            unit_type: String::new(),
            position_m: DVec3::ZERO,
            velocity_ms: DVec3::ZERO,
            position_time: 0.0,
            status_time: 0.0,
            system_status: SystemStatus::Green,
            c2_capable: true,
            commander: None,
            subordinates: Vec::new(),
            peers: Vec::new(),
            weapons: Vec::new(),
            sensors: Vec::new(),
            max_assignments: 0,
            current_assignments: 0,
            assignment_delay_s: 0.0,
            yellow_ageout_s: DEFAULT_YELLOW_AGEOUT_S,
            red_ageout_s: DEFAULT_RED_AGEOUT_S,
        }
    }

    pub fn is_green(&self) -> bool {
        self.system_status == SystemStatus::Green
    }

    pub fn is_red(&self) -> bool {
        self.system_status == SystemStatus::Red
    }

    pub fn has_weapon(&self) -> bool {
        !self.weapons.is_empty()
    }

    pub fn weapon(&self, weapon_id: u32) -> Option<&WeaponRecord> {
        self.weapons.iter().find(|w| w.weapon_id == weapon_id)
    }

    pub fn weapon_mut(&mut self, weapon_id: u32) -> Option<&mut WeaponRecord> {
        self.weapons.iter_mut().find(|w| w.weapon_id == weapon_id)
    }

    pub fn sensor(&self, sensor_id: Id) -> Option<&SensorRecord> {
        self.sensors.iter().find(|s| s.sensor_id == sensor_id)
    }

    pub fn has_sensor_kind(&self, kind: SensorKind) -> bool {
        self.sensors.iter().any(|s| s.kind == kind)
    }

    // --- C2 relations ---

    pub fn is_direct_commander(&self, other: Id) -> bool {
        self.commander.is_some_and(|c| c.same_unit(&other))
    }

    pub fn is_direct_subordinate(&self, other: Id) -> bool {
        self.subordinates.iter().any(|s| s.same_unit(&other))
    }

    pub fn is_direct_peer(&self, other: Id) -> bool {
        self.peers.iter().any(|p| p.same_unit(&other))
    }

    // --- Status checks ---

    /// GREEN when C2-capable, RED otherwise.
    pub fn c2_status(&self) -> SystemStatus {
        if self.c2_capable {
            SystemStatus::Green
        } else {
            SystemStatus::Red
        }
    }

    /// Weapon readiness: GREEN when munitions are ready (on all weapons if
    /// `require_all`), WHITE when weapons exist but the munitions check
    /// fails, RED when the asset has no weapons at all.
    pub fn weapon_status(&self, require_all: bool) -> SystemStatus {
        if self.weapons.is_empty() {
            return SystemStatus::Red;
        }
        let ready = if require_all {
            self.weapons.iter().all(WeaponRecord::has_ready_munitions)
        } else {
            self.weapons.iter().any(WeaponRecord::has_ready_munitions)
        };
        if ready {
            SystemStatus::Green
        } else {
            SystemStatus::White
        }
    }

    /// GREEN when a sensor of the given class is present.
    pub fn sensor_status(&self, kind: SensorKind) -> SystemStatus {
        if self.has_sensor_kind(kind) {
            SystemStatus::Green
        } else {
            SystemStatus::Red
        }
    }

    /// GREEN only while not moving.
    pub fn stationary_status(&self) -> SystemStatus {
        if self.velocity_ms.length_squared() > 0.0 {
            SystemStatus::Red
        } else {
            SystemStatus::Green
        }
    }

    /// Degrade perceived status when the last report has gone stale.
    /// Never upgrades: a RED asset stays RED until a fresh report arrives.
    pub fn update_age(&mut self, now: f64) {
        let age = now - self.status_time;
        if age > self.red_ageout_s {
            self.system_status = SystemStatus::Red;
        } else if age > self.yellow_ageout_s && self.system_status < SystemStatus::Yellow {
            self.system_status = SystemStatus::Yellow;
        }
    }

    /// Fold a combat status report into this record.
    ///
    /// Weapon perception and the assignment count are only overwritten when
    /// the unit carries no assignments this node knows about; while it
    /// does, local bookkeeping is the better estimate of committed
    /// munitions.
    pub fn absorb_status(&mut self, msg: &CombatStatusMessage, unit_has_assignments: bool) {
        if !msg.asset_id.same_unit(&self.id) {
            return;
        }

        self.status_time = msg.status_time;
        self.system_status = msg.system_status;
        self.max_assignments = msg.max_assignments;
        self.position_time = msg.position_time;
        self.position_m = msg.position_m;
        self.velocity_ms = msg.velocity_ms;

        if !unit_has_assignments {
            self.current_assignments = msg.current_assignments;
            for wsys in &msg.weapons {
                if let Some(weapon) = self.weapon_mut(wsys.weapon_id) {
                    weapon.estimated_total_munitions = wsys.total_munitions;
                    weapon.estimated_munitions_prepped = wsys.munitions_ready;
                    weapon.estimated_allocated_fire_channels = wsys.allocated_fire_channels;
                    weapon.total_fire_channels = wsys.total_fire_channels;
                }
            }
        }
    }

    /// Snapshot this record into a combat status report.
    pub fn generate_status_message(&self) -> CombatStatusMessage {
        CombatStatusMessage {
            sender: self.id,
            asset_id: self.id,
            status_time: self.status_time,
            system_status: self.system_status,
            max_assignments: self.max_assignments,
            current_assignments: self.current_assignments,
            position_time: self.position_time,
            position_m: self.position_m,
            velocity_ms: self.velocity_ms,
            weapons: self.weapons.iter().map(WeaponRecord::status_report).collect(),
        }
    }

    fn apply_slot_adjust(&mut self, adjust: ChainAdjust, slots: u32) {
        match adjust {
            ChainAdjust::Debit => {
                self.current_assignments = self.current_assignments.saturating_add(slots);
            }
            ChainAdjust::Credit => {
                self.current_assignments = self.current_assignments.saturating_sub(slots);
            }
        }
    }
}

/// The id-keyed table of asset records plus every cross-asset graph
/// operation over the command hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetMap {
    assets: HashMap<Id, AssetRecord>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: AssetRecord) {
        self.assets.insert(record.id, record);
    }

    pub fn get(&self, id: Id) -> Option<&AssetRecord> {
        self.assets.get(&id.unit_part())
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut AssetRecord> {
        self.assets.get_mut(&id.unit_part())
    }

    pub fn contains(&self, id: Id) -> bool {
        self.assets.contains_key(&id.unit_part())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AssetRecord> {
        self.assets.values_mut()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Age out every record's perceived status.
    pub fn update_ages(&mut self, now: f64) {
        for asset in self.assets.values_mut() {
            asset.update_age(now);
        }
    }

    /// Age out the perceived status of every subordinate below `root`.
    pub fn update_subordinate_ages(&mut self, root: Id, now: f64) {
        for id in self.subordinate_ids(root) {
            if let Some(asset) = self.get_mut(id) {
                asset.update_age(now);
            }
        }
    }

    /// All subordinate ids below `root` (transitively), breadth-first.
    pub fn subordinate_ids(&self, root: Id) -> Vec<Id> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();

        if let Some(asset) = self.get(root) {
            queue.extend(asset.subordinates.iter().copied());
        }
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.unit_part()) {
                continue;
            }
            out.push(id);
            if let Some(asset) = self.get(id) {
                queue.extend(asset.subordinates.iter().copied());
            }
        }

        out
    }

    /// True when `candidate` sits anywhere below `ancestor` in the
    /// hierarchy.
    pub fn is_subordinate(&self, ancestor: Id, candidate: Id) -> bool {
        self.subordinate_ids(ancestor)
            .iter()
            .any(|id| id.same_unit(&candidate))
    }

    /// The command path from `from` down to `end`'s unit, both inclusive.
    /// Returns `None` when `end` is not in `from`'s subordinate tree (and
    /// is not `from` itself).
    pub fn chain_path(&self, from: Id, end: Id) -> Option<Vec<Id>> {
        let from = from.unit_part();
        if from.same_unit(&end) {
            return Some(vec![from]);
        }

        // BFS with parent links so the path can be rebuilt.
        let mut parents: HashMap<Id, Id> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            let Some(asset) = self.get(current) else {
                continue;
            };
            for sub in &asset.subordinates {
                let sub = sub.unit_part();
                if parents.contains_key(&sub) {
                    continue;
                }
                parents.insert(sub, current);
                if sub.same_unit(&end) {
                    let mut path = vec![sub];
                    let mut node = sub;
                    while let Some(&parent) = parents.get(&node) {
                        path.push(parent);
                        node = parent;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(sub);
            }
        }

        None
    }

    /// True when any asset on the command path from `cmdr` down to `sub`
    /// is RED. An unresolvable path reports `false`; the assets involved
    /// may simply not be visible to this node.
    pub fn is_chain_red(&self, cmdr: Id, sub: Id) -> bool {
        match self.chain_path(cmdr, sub) {
            Some(path) => path
                .iter()
                .any(|id| self.get(*id).is_some_and(AssetRecord::is_red)),
            None => false,
        }
    }

    /// Apply assignment resource accounting along the command path from
    /// `from` down to `end`.
    ///
    /// Every asset on the path (including both ends) has its in-flight
    /// assignment count adjusted by `slots`; the terminal asset's weapon
    /// named by `end.sub_id` has its perceived munitions and fire channels
    /// adjusted by `munitions`/`slots`.
    pub fn adjust_chain(
        &mut self,
        from: Id,
        end: Id,
        adjust: ChainAdjust,
        slots: u32,
        munitions: i32,
    ) {
        let Some(path) = self.chain_path(from, end) else {
            warn!(%from, %end, "chain adjustment skipped: no command path");
            return;
        };

        for id in &path {
            if let Some(asset) = self.get_mut(*id) {
                asset.apply_slot_adjust(adjust, slots);
            }
        }

        if let Some(asset) = self.get_mut(end) {
            if let Some(weapon) = asset.weapon_mut(end.sub_id) {
                weapon.adjust(adjust, slots, munitions);
            }
        }
    }

    /// Weapon readiness across `root` and (when `aggregate`) all its
    /// subordinates.
    pub fn weapon_status(&self, root: Id, aggregate: bool, require_all: bool) -> SystemStatus {
        let Some(asset) = self.get(root) else {
            return SystemStatus::Red;
        };
        let own = asset.weapon_status(require_all);
        if !aggregate || own == SystemStatus::Green {
            return own;
        }

        let mut best = own;
        for id in self.subordinate_ids(root) {
            if let Some(sub) = self.get(id) {
                if sub.has_weapon() {
                    best = best.min(sub.weapon_status(require_all));
                }
            }
        }
        best
    }

    /// Sensor-class presence across `root` and (when `aggregate`) all its
    /// subordinates.
    pub fn sensor_status(&self, root: Id, kind: SensorKind, aggregate: bool) -> SystemStatus {
        let Some(asset) = self.get(root) else {
            return SystemStatus::Red;
        };
        if asset.has_sensor_kind(kind) {
            return SystemStatus::Green;
        }
        if aggregate {
            for id in self.subordinate_ids(root) {
                if self.get(id).is_some_and(|a| a.has_sensor_kind(kind)) {
                    return SystemStatus::Green;
                }
            }
        }
        SystemStatus::Red
    }
}
