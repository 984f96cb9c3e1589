use super::options::RunFilterOptions;
use super::section::Section;
use crate::sheet::{Sheet, SystemInfo};
use log::{debug, info};

/// Distribute sections to the systems whose horizontal span contains their
/// centroid and whose vertical reach covers it.
///
/// The result is indexed like `sheet.systems`. A section lying in the
/// overlap of two systems goes to both.
pub fn dispatch_sections(
    sections: &[Section],
    sheet: &Sheet,
    options: &RunFilterOptions,
) -> Vec<Vec<Section>> {
    let ranges: Vec<Option<(f32, f32)>> = sheet
        .systems
        .iter()
        .map(|s| s.vertical_range(options.system_margin * s.max_interline() as f32))
        .collect();
    let mut dispatched = vec![Vec::new(); sheet.systems.len()];
    for section in sections {
        let c = section.centroid();
        for (i, system) in sheet.systems.iter().enumerate() {
            let Some((top, bottom)) = ranges[i] else {
                continue;
            };
            if system.contains_abscissa(c[0]) && c[1] >= top && c[1] <= bottom {
                dispatched[i].push(section.clone());
            }
        }
    }
    debug!(
        "dispatch_sections sections={} per_system={:?}",
        sections.len(),
        dispatched.iter().map(Vec::len).collect::<Vec<_>>()
    );
    dispatched
}

/// Drop the sections whose box intersects the area of a good beam or hook.
pub fn purge_beam_sections(sections: Vec<Section>, system: &SystemInfo) -> Vec<Section> {
    let beams = system.good_beams();
    if beams.is_empty() {
        return sections;
    }
    let before = sections.len();
    let kept: Vec<Section> = sections
        .into_iter()
        .filter(|section| {
            let hit = beams.iter().any(|beam| {
                beam.bounds().intersects(&section.bounds) && beam.area.intersects(&section.bounds)
            });
            if hit && section.vip {
                info!("purge_beam_sections VIP section#{} hits a beam", section.id.0);
            }
            !hit
        })
        .collect();
    debug!(
        "purge_beam_sections system#{} removed={}",
        system.id,
        before - kept.len()
    );
    kept
}
