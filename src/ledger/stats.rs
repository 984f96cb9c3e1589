//! Sheet-wide statistical sanity check of accepted ledgers.
//!
//! Every accepted ledger yields interline-normalized ratios:
//!
//! - `delta`: distance from the staff line, for ledgers next to the staff;
//! - `height`: mean thickness;
//! - `width`: horizontal extent, capped, kept for reporting only.
//!
//! Delta and height populations each get a band `[mean + lo * sigma,
//! mean + hi * sigma]`. A ledger outside the height band, or next to the
//! staff and outside the delta band, is flagged for discard.

use crate::sheet::Sheet;
use crate::sig::InterId;
use serde::{Deserialize, Serialize};

/// Post-filter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsParams {
    pub enabled: bool,
    /// Cap on the width ratio, in interlines.
    pub max_isolated_width: f32,
    pub min_delta_sigma_coeff: f32,
    pub max_delta_sigma_coeff: f32,
    pub min_height_sigma_coeff: f32,
    pub max_height_sigma_coeff: f32,
    /// Smallest population for which a band is derived.
    pub min_population: usize,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_isolated_width: 3.0,
            min_delta_sigma_coeff: -3.0,
            max_delta_sigma_coeff: 3.0,
            min_height_sigma_coeff: -3.0,
            max_height_sigma_coeff: 2.0,
            min_population: 5,
        }
    }
}

/// Ratios measured on one accepted ledger.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSample {
    /// Position of the owning system in the sheet.
    pub system: usize,
    pub staff: u32,
    pub index: i32,
    pub inter: InterId,
    pub delta: Option<f32>,
    pub height: f32,
    pub width: f32,
}

/// Running mean and standard deviation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Population {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl Population {
    pub fn include(&mut self, value: f32) {
        let v = value as f64;
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        ((self.sum_sq / n - mean * mean).max(0.0)).sqrt() as f32
    }
}

/// Acceptance band around a population mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub mean: f32,
    pub sigma: f32,
    pub low: f32,
    pub high: f32,
}

impl Band {
    pub fn from_population(population: &Population, lo_coeff: f32, hi_coeff: f32) -> Self {
        let mean = population.mean();
        let sigma = population.std_dev();
        Self {
            mean,
            sigma,
            low: mean + lo_coeff * sigma,
            high: mean + hi_coeff * sigma,
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Bands derived from the sheet population. A band is `None` when its
/// population is too small to be trusted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBands {
    pub delta: Option<Band>,
    pub height: Option<Band>,
    /// Descriptive only.
    pub width_mean: f32,
    pub width_sigma: f32,
    pub population: usize,
}

/// Measure every accepted ledger of the sheet.
pub fn collect_samples(sheet: &Sheet, params: &StatsParams) -> Vec<LedgerSample> {
    let mut samples = Vec::new();
    for (si, system) in sheet.systems.iter().enumerate() {
        for staff in &system.staves {
            for (&index, ids) in staff.ledger_map() {
                for &id in ids {
                    let Some(ledger) = system.sig.ledger(id) else {
                        continue;
                    };
                    let interline = staff.interline.max(1) as f32;
                    let center = ledger.center();
                    let delta = if index.abs() == 1 {
                        staff
                            .side_line(index)
                            .ok()
                            .map(|line| (center[1] - line.y_at(center[0])).abs() / interline)
                    } else {
                        None
                    };
                    samples.push(LedgerSample {
                        system: si,
                        staff: staff.id,
                        index,
                        inter: id,
                        delta,
                        height: ledger.thickness / interline,
                        width: (ledger.width() as f32 / interline).min(params.max_isolated_width),
                    });
                }
            }
        }
    }
    samples
}

/// Derive the delta and height bands from the sheet population.
pub fn compute_bands(samples: &[LedgerSample], params: &StatsParams) -> LedgerBands {
    let mut delta = Population::default();
    let mut height = Population::default();
    let mut width = Population::default();
    for s in samples {
        if let Some(d) = s.delta {
            delta.include(d);
        }
        height.include(s.height);
        width.include(s.width);
    }
    let band = |p: &Population, lo: f32, hi: f32| {
        (p.count() >= params.min_population.max(1)).then(|| Band::from_population(p, lo, hi))
    };
    LedgerBands {
        delta: band(
            &delta,
            params.min_delta_sigma_coeff,
            params.max_delta_sigma_coeff,
        ),
        height: band(
            &height,
            params.min_height_sigma_coeff,
            params.max_height_sigma_coeff,
        ),
        width_mean: width.mean(),
        width_sigma: width.std_dev(),
        population: samples.len(),
    }
}

/// Samples falling outside their bands.
pub fn flag_outliers<'s>(samples: &'s [LedgerSample], bands: &LedgerBands) -> Vec<&'s LedgerSample> {
    samples
        .iter()
        .filter(|s| {
            let bad_delta = match (s.delta, bands.delta) {
                (Some(d), Some(band)) if s.index.abs() == 1 => !band.contains(d),
                _ => false,
            };
            let bad_height = bands.height.is_some_and(|band| !band.contains(s.height));
            bad_delta || bad_height
        })
        .collect()
}
