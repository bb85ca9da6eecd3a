//! Default tuning parameters for asset managers.

/// Age of the last status report beyond which a perceived asset degrades to
/// YELLOW (seconds).
pub const DEFAULT_YELLOW_AGEOUT_S: f64 = 30.0;

/// Age of the last status report beyond which a perceived asset degrades to
/// RED (seconds).
pub const DEFAULT_RED_AGEOUT_S: f64 = 120.0;

/// Broadcast own position when it has moved at least this far (meters).
pub const DEFAULT_REPORT_POSITION_EVERY_METERS: f64 = 100.0;

/// Broadcast own position at least this often (seconds).
pub const DEFAULT_REPORT_POSITION_EVERY_SECONDS: f64 = 30.0;

/// Re-evaluate and broadcast own status at least this often (seconds).
pub const DEFAULT_REPORT_STATUS_EVERY_SECONDS: f64 = 10.0;
