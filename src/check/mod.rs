//! Weighted check suites.
//!
//! A [`Check`] maps one measured scalar through an acceptance band into a
//! normalized score:
//!
//! - covariant checks (higher is better) fail hard at or below `low`, score 1
//!   at or above `high`, and interpolate linearly in between;
//! - contravariant checks mirror this (fail at or above `high`, score 1 at or
//!   below `low`).
//!
//! A [`CheckSuite`] runs an ordered table of `(weight, check)` pairs and
//! combines the scores into a grade `sum(w * s) / sum(w)`. A single hard
//! failure rejects the whole evaluation; there is no partial credit below the
//! band. Evaluation is a pure function of the context, so the same input
//! always yields the same grade.
//!
//! The suite is generic over its context type and carries plain function
//! pointers, so one table can be built once and shared across threads.

use serde::Serialize;
use std::fmt;

/// Failure tag reported when a check rejects its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Failure(pub &'static str);

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One named predicate over a context `C`.
pub struct Check<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub low: f32,
    pub high: f32,
    /// `true` when higher values are better.
    pub covariant: bool,
    pub failure: Failure,
    pub value: fn(&C) -> f32,
}

impl<C> Clone for Check<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            description: self.description,
            low: self.low,
            high: self.high,
            covariant: self.covariant,
            failure: self.failure,
            value: self.value,
        }
    }
}

impl<C> fmt::Debug for Check<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("low", &self.low)
            .field("high", &self.high)
            .field("covariant", &self.covariant)
            .field("failure", &self.failure)
            .finish()
    }
}

impl<C> Check<C> {
    /// Normalized score of `value`, `None` when the value falls outside the band.
    pub fn score(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let span = self.high - self.low;
        if self.covariant {
            if value <= self.low {
                None
            } else if value >= self.high || span <= 0.0 {
                Some(1.0)
            } else {
                Some((value - self.low) / span)
            }
        } else if value >= self.high {
            None
        } else if value <= self.low || span <= 0.0 {
            Some(1.0)
        } else {
            Some((self.high - value) / span)
        }
    }
}

/// Per-check contribution to a grade.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub name: &'static str,
    pub value: f32,
    pub score: f32,
    pub weight: f32,
}

/// Outcome of a successful suite evaluation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeImpacts {
    pub suite: &'static str,
    pub impacts: Vec<Impact>,
    pub grade: f32,
}

impl GradeImpacts {
    pub fn impact(&self, name: &str) -> Option<&Impact> {
        self.impacts.iter().find(|i| i.name == name)
    }
}

impl fmt::Display for GradeImpacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[grade={:.3}", self.suite, self.grade)?;
        for impact in &self.impacts {
            write!(f, " {}={:.3}({:.2})", impact.name, impact.value, impact.score)?;
        }
        f.write_str("]")
    }
}

/// Hard rejection by one check of the suite.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub check: &'static str,
    pub failure: Failure,
    pub value: f32,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}={:.3})", self.failure, self.check, self.value)
    }
}

/// Ordered, weighted table of checks.
pub struct CheckSuite<C> {
    name: &'static str,
    checks: Vec<(f32, Check<C>)>,
    min_threshold: f32,
}

impl<C> Clone for CheckSuite<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            checks: self.checks.clone(),
            min_threshold: self.min_threshold,
        }
    }
}

impl<C> fmt::Debug for CheckSuite<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckSuite")
            .field("name", &self.name)
            .field("checks", &self.checks)
            .field("min_threshold", &self.min_threshold)
            .finish()
    }
}

impl<C> CheckSuite<C> {
    pub fn new(name: &'static str, min_threshold: f32) -> Self {
        Self {
            name,
            checks: Vec::new(),
            min_threshold,
        }
    }

    /// Append a check with its weight. Weight 0 keeps the hard band without
    /// contributing to the grade.
    pub fn add(&mut self, weight: f32, check: Check<C>) -> &mut Self {
        self.checks.push((weight.max(0.0), check));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn min_threshold(&self) -> f32 {
        self.min_threshold
    }

    pub fn checks(&self) -> impl Iterator<Item = &Check<C>> {
        self.checks.iter().map(|(_, c)| c)
    }

    /// Evaluate every check on `context`.
    pub fn evaluate(&self, context: &C) -> Result<GradeImpacts, Rejection> {
        let mut impacts = Vec::with_capacity(self.checks.len());
        let mut weighted = 0.0f32;
        let mut total_weight = 0.0f32;
        for (weight, check) in &self.checks {
            let value = (check.value)(context);
            let score = check.score(value).ok_or(Rejection {
                check: check.name,
                failure: check.failure,
                value,
            })?;
            weighted += weight * score;
            total_weight += weight;
            impacts.push(Impact {
                name: check.name,
                value,
                score,
                weight: *weight,
            });
        }
        let grade = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };
        Ok(GradeImpacts {
            suite: self.name,
            impacts,
            grade,
        })
    }

    /// `true` when the grade is high enough to materialize an interpretation.
    pub fn accepts(&self, impacts: &GradeImpacts) -> bool {
        impacts.grade >= self.min_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOO_LOW: Failure = Failure("Test-TooLow");
    const TOO_HIGH: Failure = Failure("Test-TooHigh");

    fn first(v: &[f32; 2]) -> f32 {
        v[0]
    }

    fn second(v: &[f32; 2]) -> f32 {
        v[1]
    }

    fn suite() -> CheckSuite<[f32; 2]> {
        let mut suite = CheckSuite::new("Test", 0.5);
        suite
            .add(
                3.0,
                Check {
                    name: "Up",
                    description: "higher is better",
                    low: 1.0,
                    high: 2.0,
                    covariant: true,
                    failure: TOO_LOW,
                    value: first,
                },
            )
            .add(
                1.0,
                Check {
                    name: "Down",
                    description: "lower is better",
                    low: 0.0,
                    high: 0.4,
                    covariant: false,
                    failure: TOO_HIGH,
                    value: second,
                },
            );
        suite
    }

    #[test]
    fn covariant_band_interpolates() {
        let s = suite();
        let check = s.checks().next().expect("first check");
        assert_eq!(check.score(0.5), None);
        assert_eq!(check.score(1.0), None);
        assert!((check.score(1.5).unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(check.score(3.0), Some(1.0));
    }

    #[test]
    fn grade_is_weighted_mean() {
        let impacts = suite().evaluate(&[1.5, 0.1]).expect("accepted");
        // (3 * 0.5 + 1 * 0.75) / 4
        assert!((impacts.grade - 0.5625).abs() < 1e-6, "{impacts}");
        assert_eq!(impacts.impacts.len(), 2);
    }

    #[test]
    fn hard_failure_rejects_whole_suite() {
        let rejection = suite().evaluate(&[3.0, 0.5]).expect_err("rejected");
        assert_eq!(rejection.failure, TOO_HIGH);
        assert_eq!(rejection.check, "Down");
    }

    #[test]
    fn evaluation_is_repeatable() {
        let s = suite();
        let a = s.evaluate(&[1.7, 0.2]).unwrap();
        let b = s.evaluate(&[1.7, 0.2]).unwrap();
        assert_eq!(a, b);
    }
}
