//! Sensor manager interface.
//!
//! Sensor scan scheduling and cue execution live outside this crate; the
//! asset manager only routes events to whichever implementation is
//! attached.

use aegis_core::messages::CueMessage;
use aegis_core::TrackRecord;

/// Collaborator notified of track and cue activity. Hooks default to
/// no-ops.
pub trait SensorManager {
    /// A master track was created or refreshed.
    fn master_track_updated(&mut self, _time: f64, _track: &TrackRecord) {}

    /// A cue addressed to this platform was validated and should be acted
    /// on. `track` is the resolved local master track, absent for sensors
    /// that can search without one.
    fn handle_cue(&mut self, _time: f64, _track: Option<&TrackRecord>, _cue: &CueMessage) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoopSensorManager;

impl SensorManager for NoopSensorManager {}
