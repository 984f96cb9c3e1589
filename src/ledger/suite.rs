use super::params::LedgerParams;
use super::LedgerError;
use crate::check::{Check, CheckSuite, Failure, GradeImpacts, Rejection};
use crate::image::ImageView;
use crate::sheet::Scale;
use crate::sticks::StraightFilament;
use crate::types::Rect;
use std::collections::BTreeMap;

pub const TOO_SHORT: Failure = Failure("Hori-TooShort");
pub const TOO_THIN: Failure = Failure("Hori-TooThin");
pub const TOO_THICK: Failure = Failure("Hori-TooThick");
pub const TOO_CONCAVE: Failure = Failure("Hori-TooConcave");
pub const TOO_BENDED: Failure = Failure("Hori-TooBended");
pub const TOO_SHIFTED: Failure = Failure("Hori-TooShifted");

/// Measures of one stick against one target ordinate.
///
/// Everything a check needs is captured up front, so grading is a pure
/// function of this value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickContext {
    pub thickness: f32,
    pub length: f32,
    pub convex_ends: u32,
    pub mean_distance: f32,
    pub left_y: f32,
    pub right_y: f32,
    pub y_target: f32,
    /// Staff-specific interline.
    pub interline: f32,
    /// Main interline of the sheet.
    pub large_interline: f32,
    pub line_thickness: f32,
}

impl StickContext {
    pub fn new<I: ImageView>(
        stick: &StraightFilament,
        image: &I,
        y_target: f32,
        interline: i32,
        scale: &Scale,
    ) -> Self {
        Self {
            thickness: stick.mean_thickness,
            length: stick.length() as f32,
            convex_ends: convex_ends(image, &stick.bounds),
            mean_distance: stick.mean_distance,
            left_y: stick.start_point()[1],
            right_y: stick.stop_point()[1],
            y_target,
            interline: interline as f32,
            large_interline: scale.interline as f32,
            line_thickness: scale.line_thickness,
        }
    }
}

/// Count the stick ends standing clear of ink: the pixels just above and
/// just below the box, in its first and last columns, are all background.
pub fn convex_ends<I: ImageView>(image: &I, bounds: &Rect) -> u32 {
    [bounds.x, bounds.right() - 1]
        .into_iter()
        .filter(|&x| !image.is_fore(x, bounds.y - 1) && !image.is_fore(x, bounds.bottom()))
        .count() as u32
}

fn frac(pixels: f32, unit: f32) -> f32 {
    if unit > 0.0 {
        pixels / unit
    } else {
        f32::INFINITY
    }
}

fn min_thickness(c: &StickContext) -> f32 {
    frac(c.thickness, c.large_interline)
}

fn max_thickness(c: &StickContext) -> f32 {
    frac(c.thickness, c.line_thickness)
}

fn length(c: &StickContext) -> f32 {
    frac(c.length, c.interline)
}

fn convexity(c: &StickContext) -> f32 {
    c.convex_ends as f32
}

fn straightness(c: &StickContext) -> f32 {
    frac(c.mean_distance, c.large_interline)
}

fn left_pitch(c: &StickContext) -> f32 {
    frac((c.left_y - c.y_target).abs(), c.interline)
}

fn right_pitch(c: &StickContext) -> f32 {
    frac((c.right_y - c.y_target).abs(), c.interline)
}

/// Ledger check suite for one interline value.
#[derive(Clone, Debug)]
pub struct LedgerSuite {
    interline: i32,
    wide: bool,
    suite: CheckSuite<StickContext>,
}

impl LedgerSuite {
    /// `wide` selects the raised length band used after a wide reference ledger.
    pub fn new(interline: i32, params: &LedgerParams, wide: bool) -> Self {
        let (length_low, length_high) = if wide {
            (params.min_ledger_length_low2, params.min_ledger_length_high2)
        } else {
            (params.min_ledger_length_low, params.min_ledger_length_high)
        };
        let w = &params.weights;
        let mut suite = CheckSuite::new("Ledger", params.min_grade);
        suite
            .add(
                w.min_thickness,
                Check {
                    name: "MinTh.",
                    description: "Check that stick is thick enough",
                    low: 0.0,
                    high: params.min_thickness_high,
                    covariant: true,
                    failure: TOO_THIN,
                    value: min_thickness,
                },
            )
            .add(
                w.max_thickness,
                Check {
                    name: "MaxTh.",
                    description: "Check that stick is not too thick",
                    low: params.max_thickness_low_line,
                    high: params.max_thickness_high_line,
                    covariant: false,
                    failure: TOO_THICK,
                    value: max_thickness,
                },
            )
            .add(
                w.length,
                Check {
                    name: "Length",
                    description: "Check that stick is long enough",
                    low: length_low,
                    high: length_high,
                    covariant: true,
                    failure: TOO_SHORT,
                    value: length,
                },
            )
            .add(
                w.convexity,
                Check {
                    name: "Convex",
                    description: "Check number of convex stick ends",
                    low: params.convexity_low,
                    high: params.convexity_high,
                    covariant: true,
                    failure: TOO_CONCAVE,
                    value: convexity,
                },
            )
            .add(
                w.straight,
                Check {
                    name: "Straight",
                    description: "Check that stick is rather straight",
                    low: 0.0,
                    high: params.max_distance_high,
                    covariant: false,
                    failure: TOO_BENDED,
                    value: straightness,
                },
            )
            .add(
                w.left_pitch,
                Check {
                    name: "LPitch",
                    description: "Check that left ordinate is close to theoretical value",
                    low: 0.0,
                    high: params.ledger_margin_y,
                    covariant: false,
                    failure: TOO_SHIFTED,
                    value: left_pitch,
                },
            )
            .add(
                w.right_pitch,
                Check {
                    name: "RPitch",
                    description: "Check that right ordinate is close to theoretical value",
                    low: 0.0,
                    high: params.ledger_margin_y,
                    covariant: false,
                    failure: TOO_SHIFTED,
                    value: right_pitch,
                },
            );
        Self {
            interline,
            wide,
            suite,
        }
    }

    pub fn interline(&self) -> i32 {
        self.interline
    }

    pub fn is_wide(&self) -> bool {
        self.wide
    }

    pub fn min_threshold(&self) -> f32 {
        self.suite.min_threshold()
    }

    pub fn evaluate(&self, context: &StickContext) -> Result<GradeImpacts, Rejection> {
        self.suite.evaluate(context)
    }

    pub fn accepts(&self, impacts: &GradeImpacts) -> bool {
        self.suite.accepts(impacts)
    }

    pub fn checks(&self) -> &CheckSuite<StickContext> {
        &self.suite
    }
}

/// Pre-built suites, one regular and one wide per distinct interline.
#[derive(Clone, Debug, Default)]
pub struct Suites {
    map: BTreeMap<i32, (LedgerSuite, LedgerSuite)>,
}

impl Suites {
    pub fn new<T>(interlines: T, params: &LedgerParams) -> Self
    where
        T: IntoIterator<Item = i32>,
    {
        let map = interlines
            .into_iter()
            .map(|il| {
                (
                    il,
                    (
                        LedgerSuite::new(il, params, false),
                        LedgerSuite::new(il, params, true),
                    ),
                )
            })
            .collect();
        Self { map }
    }

    pub fn suite(&self, interline: i32, wide: bool) -> Result<&LedgerSuite, LedgerError> {
        self.map
            .get(&interline)
            .map(|(regular, large)| if wide { large } else { regular })
            .ok_or(LedgerError::MissingSuite { interline })
    }

    pub fn interlines(&self) -> impl Iterator<Item = i32> + '_ {
        self.map.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::OwnedImage;

    fn context(length: f32, thickness: f32, convex: u32, left: f32, right: f32) -> StickContext {
        StickContext {
            thickness,
            length,
            convex_ends: convex,
            mean_distance: 0.6,
            left_y: left,
            right_y: right,
            y_target: 110.0,
            interline: 20.0,
            large_interline: 20.0,
            line_thickness: 2.0,
        }
    }

    #[test]
    fn clean_ledger_grades_high() {
        let suite = LedgerSuite::new(20, &LedgerParams::default(), false);
        let impacts = suite
            .evaluate(&context(41.0, 3.0, 2, 110.0, 110.5))
            .expect("accepted");
        assert!(suite.accepts(&impacts), "{impacts}");
        assert!(impacts.grade > 0.8, "{impacts}");
        assert_eq!(impacts.impacts.len(), 7);
    }

    #[test]
    fn short_stick_is_rejected_outright() {
        let suite = LedgerSuite::new(20, &LedgerParams::default(), false);
        let rejection = suite
            .evaluate(&context(18.0, 3.0, 2, 110.0, 110.0))
            .expect_err("too short");
        assert_eq!(rejection.failure, TOO_SHORT);
    }

    #[test]
    fn shifted_stick_is_rejected() {
        let suite = LedgerSuite::new(20, &LedgerParams::default(), false);
        let rejection = suite
            .evaluate(&context(41.0, 3.0, 2, 118.0, 118.0))
            .expect_err("too far from the virtual line");
        assert_eq!(rejection.failure, TOO_SHIFTED);
    }

    #[test]
    fn wide_suite_raises_length_band() {
        let params = LedgerParams::default();
        let ctx = context(26.0, 3.0, 2, 110.0, 110.0);
        assert!(LedgerSuite::new(20, &params, false).evaluate(&ctx).is_ok());
        let rejection = LedgerSuite::new(20, &params, true)
            .evaluate(&ctx)
            .expect_err("too short after a wide reference");
        assert_eq!(rejection.failure, TOO_SHORT);
    }

    #[test]
    fn suites_are_keyed_by_interline() {
        let suites = Suites::new([20, 14], &LedgerParams::default());
        assert_eq!(suites.len(), 2);
        assert!(suites.suite(14, true).expect("small").is_wide());
        assert!(matches!(
            suites.suite(30, false),
            Err(LedgerError::MissingSuite { interline: 30 })
        ));
    }

    #[test]
    fn convexity_reads_corners_outside_the_box() {
        let mut img = OwnedImage::blank(200, 200);
        img.fill_rect(100, 124, 141, 127);
        let bounds = Rect::new(100, 124, 41, 3);
        assert_eq!(convex_ends(&img.as_view(), &bounds), 2);
        // A stem touching the right end from above.
        img.fill_rect(140, 90, 142, 124);
        assert_eq!(convex_ends(&img.as_view(), &bounds), 1);
    }
}
