//! Enumeration types used throughout the C2 node.

use serde::{Deserialize, Serialize};

/// Operational status of an asset, ordered by severity.
///
/// WHITE is a weapon-specific degradation: the unit is otherwise healthy but
/// no weapon has ready munitions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SystemStatus {
    #[default]
    Green,
    White,
    Yellow,
    Red,
}

/// Tracking state carried on a track update message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingStatus {
    /// Track updated from a live detection.
    Normal,
    /// Track extrapolated without a fresh detection.
    Coasting,
    /// Track degrading toward drop.
    Dropping,
    /// Track aged out by the reporting sensor.
    TimedOut,
    /// Track dropped by the reporting sensor.
    Dropped,
}

impl TrackingStatus {
    /// True when the message carries usable kinematics (the track lives on).
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            TrackingStatus::Normal | TrackingStatus::Coasting | TrackingStatus::Dropping
        )
    }
}

/// Why an assignment directive was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignReason {
    New,
    Retransmit,
    Update,
    /// Not supported by this node; logged and ignored on receipt.
    Reassignment,
    Cancel,
}

/// Acknowledgement status reported against an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    Wilco,
    Committed,
    CueTar,
    CueTtr,
    TarSearching,
    TtrSearching,
    TarTracking,
    TtrTracking,
    Firing,
    Miss,
    ChangedAssignedUnit,
    UpdatedShotDoctrine,
    Kill,
    Cancelled,
    HavcoSuccess,
    HavcoFailure,
    Cantco,
}

impl AckStatus {
    /// Terminal outcomes: the engagement is over and the assignment is
    /// removed on the next completion pass.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AckStatus::Kill
                | AckStatus::Cancelled
                | AckStatus::HavcoSuccess
                | AckStatus::HavcoFailure
        )
    }

    /// Statuses that close the assignment for bookkeeping purposes.
    ///
    /// CANTCO closes the assignment (resources are credited back exactly
    /// once, duplicates are no-ops) but is not a terminal engagement
    /// outcome in its own right.
    pub fn closes_assignment(&self) -> bool {
        self.is_terminal() || matches!(self, AckStatus::Cantco)
    }

    /// True when the terminal outcome means the target was defeated.
    pub fn is_success(&self) -> bool {
        matches!(self, AckStatus::Kill | AckStatus::HavcoSuccess)
    }
}

/// Scope of a systemic CANTCO: LOCAL means this node cannot prosecute the
/// track; GLOBAL means no node can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CantcoScope {
    Local,
    Global,
}

/// Policy governing munitions committed per engagement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotDoctrine {
    #[default]
    Shoot1,
    Shoot2,
    ShootLookShoot,
}

impl ShotDoctrine {
    /// Missiles committed when an assignment is created under this doctrine.
    pub fn missile_count(&self) -> u32 {
        match self {
            ShotDoctrine::Shoot1 => 1,
            ShotDoctrine::Shoot2 | ShotDoctrine::ShootLookShoot => 2,
        }
    }

    /// Missile delta implied by switching doctrine: new count minus old.
    pub fn difference(new: ShotDoctrine, old: ShotDoctrine) -> i32 {
        new.missile_count() as i32 - old.missile_count() as i32
    }
}

/// Sensor classes recognized by status checks and cueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Early warning.
    Ew,
    /// Target acquisition radar.
    Tar,
    /// Target tracking radar.
    Ttr,
    /// Radar warning receiver.
    Rwr,
}

/// Why a cue message was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CueReason {
    Cue,
    CancelCue,
}
