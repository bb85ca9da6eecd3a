//! Master track records.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::SensorKind;
use crate::id::Id;
use crate::messages::TrackUpdateMessage;

/// The authoritative, locally fused record an asset manager keeps per
/// observed target. Created and refreshed from inbound track updates;
/// deleted when the track is dropped, times out, or its sole assignment
/// completes successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: Id,
    /// Position in simulation space (meters, Cartesian).
    pub position_m: DVec3,
    /// Velocity (m/s).
    pub velocity_ms: DVec3,
    /// Simulation time of the last update.
    pub update_time: f64,
    /// Sensor class that produced the last update.
    pub reporting_sensor: Option<SensorKind>,
    /// Truth name of the underlying target, for log lines only.
    pub truth_name: String,
}

impl TrackRecord {
    /// Build a fresh record from the first update for this track id.
    pub fn from_update(msg: &TrackUpdateMessage) -> Self {
        Self {
            id: msg.track_id,
            position_m: msg.position_m,
            velocity_ms: msg.velocity_ms,
            update_time: msg.data_time,
            reporting_sensor: msg.reporting_sensor,
            truth_name: msg.truth_name.clone(),
        }
    }

    /// Fold a subsequent update into this record.
    pub fn absorb_update(&mut self, msg: &TrackUpdateMessage) {
        self.position_m = msg.position_m;
        self.velocity_ms = msg.velocity_ms;
        self.update_time = msg.data_time;
        self.reporting_sensor = msg.reporting_sensor;
        if !msg.truth_name.is_empty() {
            self.truth_name = msg.truth_name.clone();
        }
    }

    /// Ground speed magnitude (m/s).
    pub fn speed(&self) -> f64 {
        self.velocity_ms.length()
    }

    /// Dead-reckoned position at `time`.
    pub fn extrapolated_position(&self, time: f64) -> DVec3 {
        self.position_m + self.velocity_ms * (time - self.update_time)
    }
}
