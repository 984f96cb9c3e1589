use ledger_detector::image::OwnedImage;
use ledger_detector::runs::{build_run_table, SectionFactory};
use ledger_detector::sheet::{Scale, Sheet, Staff, SystemInfo};
use ledger_detector::sticks::{StickFactory, StickOptions, StraightFilament};

pub const INTERLINE: i32 = 20;
pub const LINE_THICKNESS: f32 = 2.0;
pub const PAGE_WIDTH: usize = 800;
pub const STAFF_LEFT: f32 = 20.0;
pub const STAFF_RIGHT: f32 = 780.0;
pub const LEDGER_LENGTH: i32 = 41;

pub fn scale() -> Scale {
    Scale::new(INTERLINE, LINE_THICKNESS)
}

/// Five-line staff spanning the page, top line at `top`.
pub fn staff(id: u32, top: f32) -> Staff {
    Staff::regular(id, INTERLINE, STAFF_LEFT, STAFF_RIGHT, top, 5)
}

pub fn system(id: u32, staves: Vec<Staff>) -> SystemInfo {
    SystemInfo::new(id, STAFF_LEFT as i32, STAFF_RIGHT as i32, staves)
}

pub fn sheet(systems: Vec<SystemInfo>) -> Sheet {
    Sheet::new(scale(), systems)
}

/// Staff-free page: white background, ledgers painted on demand.
pub fn page(height: usize) -> OwnedImage {
    OwnedImage::blank(PAGE_WIDTH, height)
}

/// Paint a horizontal ledger whose rows start at `y_center - thickness / 2`.
pub fn draw_ledger(img: &mut OwnedImage, x: i32, y_center: i32, thickness: i32) {
    let y0 = y_center - thickness / 2;
    img.fill_rect(x, y0, x + LEDGER_LENGTH, y0 + thickness);
}

/// Sticks of a whole page, without any staff filtering.
pub fn sticks_of(img: &OwnedImage) -> Vec<StraightFilament> {
    let table = build_run_table(&img.as_view());
    let sections = SectionFactory::build(&table);
    StickFactory::new(&scale(), &StickOptions::default()).retrieve_sticks(&sections)
}
