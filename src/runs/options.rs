use serde::{Deserialize, Serialize};

/// Knobs of the run filter and the per-system dispatch.
///
/// - `min_distance_from_staff`: runs closer than this fraction of the
///   closest staff's interline belong to that staff.
/// - `system_margin`: vertical reach of a system beyond its first and last
///   staff lines, in interlines of its largest staff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFilterOptions {
    pub min_distance_from_staff: f32,
    pub system_margin: f32,
}

impl Default for RunFilterOptions {
    fn default() -> Self {
        Self {
            min_distance_from_staff: 0.25,
            system_margin: 6.0,
        }
    }
}
