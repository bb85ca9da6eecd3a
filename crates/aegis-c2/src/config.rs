//! Asset manager configuration.

use serde::{Deserialize, Serialize};

use aegis_core::constants::*;
use aegis_core::Id;

/// Configuration for one asset manager node. Host code builds this from
/// its scenario definition and overrides fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManagerConfig {
    /// This node's own asset id. Must exist in the asset table.
    pub own_id: Id,

    /// Assignment capacity advertised in own status reports.
    pub max_assignments: u32,
    /// Simulated decision latency added to outgoing assignments when this
    /// node has commit authority (seconds).
    pub assignment_delay_s: f64,

    // --- Own-report cadence ---
    pub report_position_every_meters: f64,
    pub report_position_every_seconds: f64,
    pub report_status_every_seconds: f64,

    // --- Perception age-out ---
    pub yellow_ageout_s: f64,
    pub red_ageout_s: f64,

    // --- Own-status checks ---
    /// Satisfy subsystem checks from subordinates as well as this asset.
    pub aggregate_unit_status: bool,
    /// Report RED while moving.
    pub stationary_ops_only: bool,
    pub weapon_required: bool,
    /// With `weapon_required`, demand ready munitions on every weapon
    /// rather than any.
    pub require_all_weapons: bool,
    pub ew_required: bool,
    pub tar_required: bool,
    pub ttr_required: bool,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            own_id: Id::NONE,
            max_assignments: 0,
            assignment_delay_s: 0.0,
            report_position_every_meters: DEFAULT_REPORT_POSITION_EVERY_METERS,
            report_position_every_seconds: DEFAULT_REPORT_POSITION_EVERY_SECONDS,
            report_status_every_seconds: DEFAULT_REPORT_STATUS_EVERY_SECONDS,
            yellow_ageout_s: DEFAULT_YELLOW_AGEOUT_S,
            red_ageout_s: DEFAULT_RED_AGEOUT_S,
            aggregate_unit_status: false,
            stationary_ops_only: false,
            weapon_required: false,
            require_all_weapons: false,
            ew_required: false,
            tar_required: false,
            ttr_required: false,
        }
    }
}

impl AssetManagerConfig {
    pub fn new(own_id: Id) -> Self {
        Self {
            own_id,
            ..Default::default()
        }
    }
}
