use ledger_detector::image::OwnedImage;
use ledger_detector::sheet::{Scale, Sheet, Staff, SystemInfo};
use ledger_detector::{DetectorParams, LedgerDetector};

fn main() {
    // Demo stub: one staff with two ledgers above it and one below
    let (w, h) = (640usize, 480usize);
    let mut image = OwnedImage::blank(w, h);
    image.fill_rect(300, 179, 341, 182);
    image.fill_rect(300, 159, 341, 162);
    image.fill_rect(420, 299, 461, 302);

    let staff = Staff::regular(1, 20, 40.0, 600.0, 200.0, 5);
    let mut sheet = Sheet::new(
        Scale::new(20, 2.0),
        vec![SystemInfo::new(1, 40, 600, vec![staff])],
    );

    let det = LedgerDetector::new(DetectorParams::default());
    let report = det.process(&mut sheet, &image.as_view());
    println!(
        "ledgers={} latency_ms={:.3}",
        report.ledger_count(),
        report.timings.total_ms
    );
}
