use super::run::{Run, RunTable};
use crate::types::Rect;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

/// Vertically stacked runs with identical abscissa range.
///
/// Zero shift between runs makes every section a filled rectangle, so the
/// bounds fully describe its pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub bounds: Rect,
    #[serde(skip)]
    pub vip: bool,
}

impl Section {
    pub fn weight(&self) -> usize {
        (self.bounds.w.max(0) * self.bounds.h.max(0)) as usize
    }

    pub fn length(&self) -> i32 {
        self.bounds.w
    }

    pub fn thickness(&self) -> i32 {
        self.bounds.h
    }

    pub fn centroid(&self) -> [f32; 2] {
        [
            self.bounds.x as f32 + (self.bounds.w - 1) as f32 * 0.5,
            self.bounds.y as f32 + (self.bounds.h - 1) as f32 * 0.5,
        ]
    }
}

/// Packs runs into sections with zero horizontal shift tolerance.
#[derive(Clone, Copy, Debug, Default)]
pub struct SectionFactory;

impl SectionFactory {
    /// A run extends the section ending on the row above only when both runs
    /// have the same start and length; any shift opens a new section.
    pub fn build(table: &RunTable) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        // Open sections ending on the previous row: (run, section index).
        let mut open: Vec<(Run, usize)> = Vec::new();
        for y in 0..table.height() {
            let mut next_open = Vec::with_capacity(table.row(y).len());
            let mut cursor = 0usize;
            for run in table.row(y) {
                while cursor < open.len() && open[cursor].0.start < run.start {
                    cursor += 1;
                }
                let idx = match open.get(cursor) {
                    Some((prev, idx)) if prev == run => {
                        sections[*idx].bounds.h += 1;
                        *idx
                    }
                    _ => {
                        sections.push(Section {
                            id: SectionId(sections.len() as u32),
                            bounds: Rect::new(run.start, y as i32, run.length, 1),
                            vip: false,
                        });
                        sections.len() - 1
                    }
                };
                next_open.push((*run, idx));
            }
            open = next_open;
        }
        sections
    }
}
