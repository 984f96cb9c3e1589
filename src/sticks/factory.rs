use super::filament::{StickId, StraightFilament};
use crate::runs::Section;
use crate::sheet::Scale;
use crate::sig::BeamInter;
use crate::types::Rect;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stick building knobs.
///
/// - `max_thickness_line`: thickness bound as a fraction of staff-line
///   thickness.
/// - `max_thickness_interline`: thickness bound as a fraction of the main
///   interline. The lower of both bounds applies.
/// - `min_core_section_length`: a stick must start from a section at least
///   this long (main interline fraction).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickOptions {
    pub max_thickness_line: f32,
    pub max_thickness_interline: f32,
    pub min_core_section_length: f32,
}

impl Default for StickOptions {
    fn default() -> Self {
        Self {
            max_thickness_line: 3.25,
            max_thickness_interline: 0.4,
            min_core_section_length: 1.0,
        }
    }
}

/// Builds horizontal sticks out of the sections of one system.
#[derive(Clone, Copy, Debug)]
pub struct StickFactory {
    max_thickness: i32,
    min_core_length: i32,
}

impl StickFactory {
    pub fn new(scale: &Scale, options: &StickOptions) -> Self {
        Self {
            max_thickness: scale
                .line_frac_to_pixels(options.max_thickness_line)
                .min(scale.to_pixels(options.max_thickness_interline)),
            min_core_length: scale.to_pixels(options.min_core_section_length),
        }
    }

    pub fn max_thickness(&self) -> i32 {
        self.max_thickness
    }

    pub fn min_core_length(&self) -> i32 {
        self.min_core_length
    }

    /// Grow one stick per long-enough core section, absorbing touching thin
    /// sections as long as no column of the stick gets thicker than the
    /// maximum.
    ///
    /// Cores are processed longest first; a section joins at most one stick.
    pub fn retrieve_sticks(&self, sections: &[Section]) -> Vec<StraightFilament> {
        let eligible: Vec<&Section> = sections
            .iter()
            .filter(|s| s.thickness() <= self.max_thickness)
            .collect();
        let mut cores: Vec<usize> = (0..eligible.len())
            .filter(|&i| eligible[i].length() >= self.min_core_length)
            .collect();
        cores.sort_by(|&a, &b| {
            eligible[b]
                .length()
                .cmp(&eligible[a].length())
                .then(eligible[a].id.cmp(&eligible[b].id))
        });

        let mut assigned = vec![false; eligible.len()];
        let mut sticks = Vec::new();
        for core in cores {
            if assigned[core] {
                continue;
            }
            assigned[core] = true;
            let mut members = vec![core];
            let mut columns = ColumnExtent::default();
            columns.add(&eligible[core].bounds);
            let mut bounds = eligible[core].bounds;

            loop {
                let mut grown = false;
                for i in 0..eligible.len() {
                    if assigned[i] {
                        continue;
                    }
                    let candidate = &eligible[i].bounds;
                    if !bounds.grow(1, 1).intersects(candidate) {
                        continue;
                    }
                    let touching = members
                        .iter()
                        .any(|&m| eligible[m].bounds.grow(1, 1).intersects(candidate));
                    if !touching || columns.thickness_with(candidate) > self.max_thickness {
                        continue;
                    }
                    assigned[i] = true;
                    members.push(i);
                    columns.add(candidate);
                    bounds = bounds.union(candidate);
                    grown = true;
                }
                if !grown {
                    break;
                }
            }

            let parts: Vec<&Section> = members.iter().map(|&m| eligible[m]).collect();
            let id = StickId(sticks.len() as u32);
            if let Some(stick) = StraightFilament::from_sections(id, &parts) {
                if stick.vip {
                    info!("StickFactory::retrieve_sticks VIP {:?} {:?}", stick.id, stick.bounds);
                }
                sticks.push(stick);
            }
        }
        debug!(
            "StickFactory::retrieve_sticks sections={} eligible={} sticks={}",
            sections.len(),
            eligible.len(),
            sticks.len()
        );
        sticks
    }
}

/// Vertical extent covered in each column of a growing stick.
#[derive(Default)]
struct ColumnExtent {
    columns: BTreeMap<i32, (i32, i32)>,
}

impl ColumnExtent {
    fn add(&mut self, rect: &Rect) {
        for x in rect.x..rect.right() {
            let e = self.columns.entry(x).or_insert((rect.y, rect.bottom()));
            e.0 = e.0.min(rect.y);
            e.1 = e.1.max(rect.bottom());
        }
    }

    /// Largest column thickness if `rect` were added.
    fn thickness_with(&self, rect: &Rect) -> i32 {
        (rect.x..rect.right())
            .map(|x| match self.columns.get(&x) {
                Some(&(top, bottom)) => bottom.max(rect.bottom()) - top.min(rect.y),
                None => rect.h,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Remove the sticks whose middle point lies inside a good beam or hook.
///
/// `beams` must be sorted by left abscissa; scanning stops at the first
/// beam starting right of the stick middle. Survivors are tagged as ledger
/// candidates. Returns the kept sticks and the number purged.
pub fn purge_beam_overlaps(
    sticks: Vec<StraightFilament>,
    beams: &[&BeamInter],
) -> (Vec<StraightFilament>, usize) {
    let before = sticks.len();
    let mut kept = Vec::with_capacity(before);
    for mut stick in sticks {
        let middle = stick.middle();
        let mut overlap = false;
        for beam in beams {
            if beam.area.contains(middle) {
                overlap = true;
                break;
            }
            if beam.bounds().x as f32 > middle[0] {
                break;
            }
        }
        if overlap {
            if stick.vip {
                info!("purge_beam_overlaps VIP {:?} overlaps a beam", stick.id);
            } else {
                trace!("purge_beam_overlaps {:?} overlaps a beam", stick.id);
            }
            continue;
        }
        stick.candidate = true;
        kept.push(stick);
    }
    let purged = before - kept.len();
    (kept, purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::SectionId;

    fn section(id: u32, x: i32, y: i32, w: i32, h: i32) -> Section {
        Section {
            id: SectionId(id),
            bounds: Rect::new(x, y, w, h),
            vip: false,
        }
    }

    fn factory() -> StickFactory {
        // interline 20, line thickness 2: max thickness min(7, 8), core 20.
        StickFactory::new(&Scale::new(20, 2.0), &StickOptions::default())
    }

    #[test]
    fn bounds_follow_the_scale() {
        let f = factory();
        assert_eq!(f.max_thickness(), 7);
        assert_eq!(f.min_core_length(), 20);
    }

    #[test]
    fn core_absorbs_touching_thin_sections() {
        let sections = vec![
            section(0, 100, 124, 30, 3),
            section(1, 130, 125, 12, 3),
            section(2, 300, 50, 10, 2),
        ];
        let sticks = factory().retrieve_sticks(&sections);
        assert_eq!(sticks.len(), 1);
        assert_eq!(sticks[0].bounds, Rect::new(100, 124, 42, 4));
        assert_eq!(sticks[0].sections.len(), 2);
    }

    #[test]
    fn thick_or_short_material_makes_no_stick() {
        let sections = vec![section(0, 100, 100, 40, 12), section(1, 200, 100, 15, 2)];
        assert!(factory().retrieve_sticks(&sections).is_empty());
    }

    #[test]
    fn growth_stops_at_max_column_thickness() {
        let sections = vec![section(0, 100, 124, 40, 3), section(1, 110, 127, 10, 5)];
        let sticks = factory().retrieve_sticks(&sections);
        assert_eq!(sticks.len(), 1);
        assert_eq!(sticks[0].sections, vec![SectionId(0)]);
    }

    #[test]
    fn beam_overlap_purges_by_middle_point() {
        let sections = vec![section(0, 100, 148, 40, 3), section(1, 300, 148, 40, 3)];
        let sticks = factory().retrieve_sticks(&sections);
        let beam = BeamInter::from_median([90.0, 149.0], [160.0, 149.0], 8.0, 0.9);
        let (kept, purged) = purge_beam_overlaps(sticks, &[&beam]);
        assert_eq!(purged, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bounds.x, 300);
        assert!(kept[0].candidate);
    }
}
