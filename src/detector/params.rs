//! Parameter types configuring the detector stages.
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON config may
//! override any subset of the calibrated values.

use crate::ledger::{LedgerParams, StatsParams};
use crate::runs::RunFilterOptions;
use crate::sticks::StickOptions;
use serde::{Deserialize, Serialize};

/// Detector-wide parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Run filter and system dispatch.
    pub runs: RunFilterOptions,
    /// Stick building.
    pub sticks: StickOptions,
    /// Virtual-line search and check suite.
    pub ledgers: LedgerParams,
    /// Sheet-wide statistical post-filter.
    pub stats: StatsParams,
    /// Section ids whose processing is logged verbosely.
    pub vip_sections: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: DetectorParams = serde_json::from_str(
            r#"{ "ledgers": { "min_grade": 0.6 }, "stats": { "max_height_sigma_coeff": 2.5 } }"#,
        )
        .expect("valid params");
        assert_eq!(params.ledgers.min_grade, 0.6);
        assert_eq!(params.stats.max_height_sigma_coeff, 2.5);
        assert_eq!(params.ledgers.ledger_margin_y, 0.35);
        assert_eq!(params.runs.min_distance_from_staff, 0.25);
    }
}
