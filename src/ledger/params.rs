use serde::{Deserialize, Serialize};

/// Weights of the ledger checks in the suite grade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckWeights {
    pub min_thickness: f32,
    pub max_thickness: f32,
    pub length: f32,
    pub convexity: f32,
    pub straight: f32,
    pub left_pitch: f32,
    pub right_pitch: f32,
}

impl Default for CheckWeights {
    fn default() -> Self {
        Self {
            min_thickness: 0.5,
            max_thickness: 0.0,
            length: 4.0,
            convexity: 2.0,
            straight: 1.0,
            left_pitch: 0.5,
            right_pitch: 0.5,
        }
    }
}

/// Virtual-line search and grading parameters.
///
/// Unless stated otherwise values are interline fractions. Length and pitch
/// bounds use the staff-specific interline; thickness, straightness and
/// abscissa overlap use the main interline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    /// Vertical margin around the virtual line, also the pitch check bound.
    pub ledger_margin_y: f32,
    /// Minimum abscissa overlap with the reference ledger of the previous line.
    pub min_abscissa_overlap: f32,
    pub min_ledger_length_low: f32,
    pub min_ledger_length_high: f32,
    /// Reference ledgers at least this wide raise the length band.
    pub min_wide_ledger_length: f32,
    pub min_ledger_length_low2: f32,
    pub min_ledger_length_high2: f32,
    pub min_thickness_high: f32,
    /// Staff-line thickness fraction below which a stick is not too thick.
    pub max_thickness_low_line: f32,
    /// Staff-line thickness fraction from which a stick is too thick.
    pub max_thickness_high_line: f32,
    /// Mean pixel distance to the fitted line from which a stick is bent.
    pub max_distance_high: f32,
    /// Convex end count band.
    pub convexity_low: f32,
    pub convexity_high: f32,
    /// Lowest grade materialized as a ledger.
    pub min_grade: f32,
    pub weights: CheckWeights,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            ledger_margin_y: 0.35,
            min_abscissa_overlap: 0.75,
            min_ledger_length_low: 1.0,
            min_ledger_length_high: 1.5,
            min_wide_ledger_length: 1.5,
            min_ledger_length_low2: 1.4,
            min_ledger_length_high2: 2.0,
            min_thickness_high: 0.25,
            max_thickness_low_line: 1.0,
            max_thickness_high_line: 3.25,
            max_distance_high: 0.3,
            convexity_low: -0.5,
            convexity_high: 2.0,
            min_grade: 0.5,
            weights: CheckWeights::default(),
        }
    }
}
