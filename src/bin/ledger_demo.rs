use ledger_detector::config::ledgers;
use ledger_detector::diagnostics::LedgerReport;
use ledger_detector::image::io::{
    load_grayscale_image, read_json_file, save_grayscale_u8, write_json_file,
};
use ledger_detector::image::OwnedImage;
use ledger_detector::sheet::SheetModel;
use ledger_detector::LedgerDetector;
use log::info;
use std::env;
use std::path::Path;

/// Gray level of accepted ledgers in the overlay image.
const OVERLAY_SHADE: u8 = 160;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = ledgers::load_config(Path::new(&config_path))?;

    let gray = load_grayscale_image(&config.input)?;
    let model: SheetModel = read_json_file(&config.sheet)?;
    let mut sheet = model.into_sheet();
    info!(
        "ledger_demo input={} {}x{} systems={}",
        config.input.display(),
        gray.width(),
        gray.height(),
        sheet.systems.len()
    );

    let detector = LedgerDetector::new(config.params);
    let report = detector.process(&mut sheet, &gray.as_view());

    write_json_file(&config.output.report_json, &report)?;
    if let Some(path) = &config.output.overlay_image {
        let overlay = render_overlay(&gray, &report);
        save_grayscale_u8(&overlay, path)?;
        println!("Saved ledger overlay to {}", path.display());
    }

    for system in &report.systems {
        if let Some(err) = &system.error {
            println!("system#{} failed: {err}", system.system);
        }
    }
    println!(
        "Detected {} ledgers in {} staves ({:.3} ms), report saved to {}",
        report.ledger_count(),
        report.staves.len(),
        report.timings.total_ms,
        config.output.report_json.display()
    );

    Ok(())
}

fn render_overlay(gray: &OwnedImage, report: &LedgerReport) -> OwnedImage {
    let mut overlay = gray.clone();
    for ledger in report.staves.iter().flat_map(|s| s.ledgers.iter()) {
        let half = (ledger.thickness * 0.5).ceil().max(1.0);
        let top = ledger.start[1].min(ledger.stop[1]) - half;
        let bottom = ledger.start[1].max(ledger.stop[1]) + half;
        overlay.shade_rect(
            ledger.start[0].floor() as i32,
            top.floor() as i32,
            ledger.stop[0].ceil() as i32 + 1,
            bottom.ceil() as i32 + 1,
            OVERLAY_SHADE,
        );
    }
    overlay
}

fn usage() -> String {
    "Usage: ledger_demo <config.json>".to_string()
}
