use crate::runs::{Section, SectionId};
use crate::types::{LineFit, Rect};
use serde::{Deserialize, Serialize};

/// Identifier of a stick inside one system's candidate pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StickId(pub u32);

/// Rather horizontal stick assembled from one or more sections.
///
/// Pixels are addressed by their integer coordinates; the center line is
/// the weighted least-squares fit of the column centers of every member
/// section.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StraightFilament {
    pub id: StickId,
    pub sections: Vec<SectionId>,
    pub bounds: Rect,
    pub line: LineFit,
    /// Foreground pixel count.
    pub weight: usize,
    /// Pixels per covered column.
    pub mean_thickness: f32,
    /// Mean perpendicular distance of the pixels to `line`.
    pub mean_distance: f32,
    /// Set once the stick survived the beam purge.
    pub candidate: bool,
    #[serde(skip)]
    pub vip: bool,
}

impl StraightFilament {
    /// Build a stick from its member sections. `None` when `sections` is empty.
    pub fn from_sections(id: StickId, sections: &[&Section]) -> Option<Self> {
        let bounds = sections
            .iter()
            .map(|s| s.bounds)
            .reduce(|a, b| a.union(&b))?;
        let mut samples = Vec::new();
        for s in sections {
            let yc = s.bounds.y as f32 + (s.bounds.h - 1) as f32 * 0.5;
            for x in s.bounds.x..s.bounds.right() {
                samples.push((x as f32, yc, s.bounds.h as f32));
            }
        }
        let line = LineFit::fit(&samples)?;
        let weight: usize = sections.iter().map(|s| s.weight()).sum();
        let mut distance_sum = 0.0f32;
        for s in sections {
            for y in s.bounds.y..s.bounds.bottom() {
                for x in s.bounds.x..s.bounds.right() {
                    distance_sum += line.distance([x as f32, y as f32]);
                }
            }
        }
        let width = bounds.w.max(1) as f32;
        Some(Self {
            id,
            sections: sections.iter().map(|s| s.id).collect(),
            bounds,
            line,
            weight,
            mean_thickness: weight as f32 / width,
            mean_distance: if weight > 0 {
                distance_sum / weight as f32
            } else {
                0.0
            },
            candidate: false,
            vip: sections.iter().any(|s| s.vip),
        })
    }

    /// Left end of the center line.
    pub fn start_point(&self) -> [f32; 2] {
        let x = self.bounds.x as f32;
        [x, self.line.y_at(x)]
    }

    /// Right end of the center line.
    pub fn stop_point(&self) -> [f32; 2] {
        let x = (self.bounds.right() - 1) as f32;
        [x, self.line.y_at(x)]
    }

    /// Midpoint between start and stop points.
    pub fn middle(&self) -> [f32; 2] {
        let (a, b) = (self.start_point(), self.stop_point());
        [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
    }

    /// Horizontal extent in pixels.
    pub fn length(&self) -> i32 {
        self.bounds.w
    }

    pub fn y_at(&self, x: f32) -> f32 {
        self.line.y_at(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: u32, x: i32, y: i32, w: i32, h: i32) -> Section {
        Section {
            id: SectionId(id),
            bounds: Rect::new(x, y, w, h),
            vip: false,
        }
    }

    #[test]
    fn rectangle_stick_measures() {
        let s = section(0, 100, 124, 41, 3);
        let stick = StraightFilament::from_sections(StickId(0), &[&s]).expect("stick");
        assert_eq!(stick.length(), 41);
        assert!((stick.mean_thickness - 3.0).abs() < 1e-5);
        assert_eq!(stick.start_point(), [100.0, 125.0]);
        assert_eq!(stick.stop_point(), [140.0, 125.0]);
        assert_eq!(stick.middle(), [120.0, 125.0]);
        // Rows at -1, 0, +1 around the center line.
        assert!((stick.mean_distance - 2.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn stepped_sections_fit_a_slanted_line() {
        let a = section(0, 0, 10, 20, 2);
        let b = section(1, 20, 11, 20, 2);
        let stick = StraightFilament::from_sections(StickId(3), &[&a, &b]).expect("stick");
        assert_eq!(stick.bounds, Rect::new(0, 10, 40, 3));
        assert!(stick.line.slope > 0.0);
        assert_eq!(stick.sections, vec![SectionId(0), SectionId(1)]);
        assert!(StraightFilament::from_sections(StickId(4), &[]).is_none());
    }
}
