mod common;

use common::synthetic_score::{
    draw_ledger, page, scale, sheet, staff, sticks_of, system, LEDGER_LENGTH, STAFF_LEFT,
    STAFF_RIGHT,
};
use ledger_detector::ledger::{LedgerParams, StickVerdict};
use ledger_detector::sheet::{Sheet, Staff};
use ledger_detector::sig::BeamInter;
use ledger_detector::sticks::StickId;
use ledger_detector::{DetectorParams, LedgerDetector, LedgerReport};
use std::collections::{BTreeMap, BTreeSet};

fn detect(sheet: &mut Sheet, img: &ledger_detector::image::OwnedImage) -> LedgerReport {
    let _ = env_logger::builder().is_test(true).try_init();
    LedgerDetector::new(DetectorParams::default()).process(sheet, &img.as_view())
}

/// Every ledger beyond the first line overlaps a ledger one line closer to
/// the staff by more than the minimum abscissa overlap, and lies further
/// away from it.
fn assert_chained(sheet: &Sheet) {
    let min_overlap = scale().to_pixels(LedgerParams::default().min_abscissa_overlap);
    assert_eq!(min_overlap, 15);
    for system in &sheet.systems {
        for staff in &system.staves {
            for (&index, ids) in staff.ledger_map() {
                if index.abs() == 1 {
                    continue;
                }
                let inner = staff.ledgers(index - index.signum());
                for &id in ids {
                    let ledger = system.sig.ledger(id).expect("live ledger");
                    let support = inner.iter().filter_map(|&i| system.sig.ledger(i)).find(|l| {
                        l.bounds.x_overlap(&ledger.bounds) > min_overlap
                    });
                    let support = support.unwrap_or_else(|| {
                        panic!("orphan ledger at index {index} in staff#{}", staff.id)
                    });
                    let outward = (ledger.center()[1] - support.center()[1]) * index.signum() as f32;
                    assert!(outward > 0.0, "index {index} not further than its support");
                }
            }
        }
    }
}

#[test]
fn ledgers_are_found_on_both_sides_of_a_staff() {
    let mut img = page(320);
    draw_ledger(&mut img, 100, 80, 3);
    draw_ledger(&mut img, 105, 60, 3);
    draw_ledger(&mut img, 110, 40, 3);
    draw_ledger(&mut img, 300, 200, 3);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)])]);

    let report = detect(&mut sheet, &img);

    assert_eq!(report.ledger_count(), 4);
    let staff = &sheet.systems[0].staves[0];
    for index in [-3, -2, -1, 1] {
        assert_eq!(staff.ledgers(index).len(), 1, "index {index}");
    }
    assert!(staff.ledgers(2).is_empty());
    assert_chained(&sheet);

    let staff_report = report.staff(1).expect("staff report");
    assert_eq!(staff_report.ledgers.len(), 4);
    assert!(staff_report.ledgers.iter().all(|l| l.grade >= 0.5));
    assert!(report.systems[0].error.is_none());
    assert_eq!(report.input.staves, 1);
    for label in ["runs", "firstPass", "postFilter"] {
        assert!(report.timings.stage(label).is_some(), "missing {label} timing");
    }
    assert!(report.systems[0].timings.stage("ledgers").is_some());
}

#[test]
fn ledger_without_inner_support_is_ignored() {
    let mut img = page(320);
    draw_ledger(&mut img, 100, 80, 3);
    // Line -2 far to the right of line -1.
    draw_ledger(&mut img, 400, 60, 3);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)])]);

    detect(&mut sheet, &img);

    let staff = &sheet.systems[0].staves[0];
    assert_eq!(staff.ledgers(-1).len(), 1);
    assert!(staff.ledgers(-2).is_empty());
    assert_chained(&sheet);
}

/// Ledgers per staff id, as (index, stick, left abscissa).
fn ledgers_by_staff(sheet: &Sheet) -> BTreeMap<u32, Vec<(i32, StickId, i32)>> {
    let mut found = BTreeMap::new();
    for system in &sheet.systems {
        for staff in &system.staves {
            let mut rows: Vec<(i32, StickId, i32)> = staff
                .ledger_map()
                .iter()
                .flat_map(|(&index, ids)| ids.iter().map(move |&id| (index, id)))
                .filter_map(|(index, id)| system.sig.ledger(id).map(|l| (index, l.stick, l.bounds.x)))
                .collect();
            rows.sort();
            found.insert(staff.id, rows);
        }
    }
    found
}

#[test]
fn staves_sharing_a_gap_do_not_depend_on_their_order() {
    // Chain filling the gap between two staves of the same system.
    let mut img = page(480);
    for (k, y) in [200, 220, 240, 260, 280].into_iter().enumerate() {
        draw_ledger(&mut img, 100 + 3 * k as i32, y, 3);
    }
    let mut forward = sheet(vec![system(1, vec![staff(1, 100.0), staff(2, 300.0)])]);
    let mut backward = sheet(vec![system(1, vec![staff(2, 300.0), staff(1, 100.0)])]);

    detect(&mut forward, &img);
    detect(&mut backward, &img);

    let found = ledgers_by_staff(&forward);
    assert_eq!(found, ledgers_by_staff(&backward));
    let upper: Vec<i32> = found[&1].iter().map(|r| r.0).collect();
    let lower: Vec<i32> = found[&2].iter().map(|r| r.0).collect();
    assert_eq!(upper, vec![1, 2, 3, 4, 5]);
    assert_eq!(lower, vec![-5, -4, -3, -2, -1]);

    // Each staff sees every stick: the ledger next to one staff is the
    // outermost ledger of the other.
    let upper_sticks: BTreeSet<StickId> = found[&1].iter().map(|r| r.1).collect();
    let lower_sticks: BTreeSet<StickId> = found[&2].iter().map(|r| r.1).collect();
    assert_eq!(upper_sticks, lower_sticks);
    for system in &forward.systems {
        for staff in &system.staves {
            for &id in staff.ledger_map().values().flatten() {
                let ledger = system.sig.ledger(id).expect("live ledger");
                assert_eq!(ledger.staff, Some(staff.id));
            }
        }
    }
    assert_chained(&forward);
    assert_chained(&backward);
}

#[test]
fn sections_under_good_beams_never_become_ledgers() {
    let mut img = page(320);
    draw_ledger(&mut img, 100, 80, 3);
    draw_ledger(&mut img, 500, 80, 3);
    let mut sys = system(1, vec![staff(1, 100.0)]);
    sys.add_beam(BeamInter::from_median([480.0, 80.0], [560.0, 80.0], 8.0, 0.8));
    let mut sheet = sheet(vec![sys]);

    let report = detect(&mut sheet, &img);

    assert_eq!(report.ledger_count(), 1);
    let ledgers = &report.staff(1).expect("staff").ledgers;
    assert!(ledgers[0].start[0] < 200.0);
    assert!(report.systems[0].beam_sections >= 1);
}

#[test]
fn failing_system_does_not_affect_its_siblings() {
    let mut img = page(640);
    draw_ledger(&mut img, 100, 80, 3);
    let broken = Staff::new(9, 20, Vec::new());
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)]), system(2, vec![broken])]);

    let report = detect(&mut sheet, &img);

    assert!(report.systems[0].error.is_none());
    assert!(report.systems[1].error.is_some());
    assert_eq!(sheet.systems[0].staves[0].ledgers(-1).len(), 1);
    assert_eq!(sheet.systems[1].staves[0].ledger_count(), 0);
    assert_eq!(report.systems[1].ledgers, 0);
}

#[test]
fn staff_with_runaway_coordinates_fails_alone() {
    let mut img = page(640);
    draw_ledger(&mut img, 100, 80, 3);
    let runaway = Staff::regular(9, 20, -3.0e9, 3.0e9, 400.0, 5);
    let mut sheet = sheet(vec![
        system(1, vec![staff(1, 100.0)]),
        system(2, vec![runaway]),
    ]);

    let report = detect(&mut sheet, &img);

    assert!(report.systems[0].error.is_none());
    let error = report.systems[1].error.as_deref().expect("system 2 fails");
    assert!(error.contains("out of range"), "{error}");
    assert_eq!(sheet.systems[0].staves[0].ledgers(-1).len(), 1);
    assert_eq!(sheet.systems[1].staves[0].ledger_count(), 0);
    assert_eq!(report.ledger_count(), 1);
}

#[test]
fn thick_outlier_is_discarded_and_its_line_searched_again() {
    let mut img = page(320);
    for x in [60, 160, 260, 360] {
        draw_ledger(&mut img, x, 80, 3);
        draw_ledger(&mut img, x, 200, 3);
    }
    draw_ledger(&mut img, 460, 80, 6);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)])]);

    let report = detect(&mut sheet, &img);

    let post = report.post_filter.as_ref().expect("post filter enabled");
    assert_eq!(post.population, 9);
    assert_eq!(post.discarded.len(), 1);
    assert_eq!(post.discarded[0].index, -1);
    assert_eq!(post.rebuilt_systems, vec![1]);
    assert!(post.errors.is_empty());

    let staff = &sheet.systems[0].staves[0];
    assert_eq!(staff.ledgers(-1).len(), 4);
    assert_eq!(staff.ledgers(1).len(), 4);
    assert_eq!(report.ledger_count(), 8);
    let sig = &sheet.systems[0].sig;
    assert!(staff
        .ledger_map()
        .values()
        .flatten()
        .all(|&id| sig.ledger(id).is_some_and(|l| l.thickness < 5.0)));
}

#[test]
fn disabled_post_filter_keeps_first_pass_ledgers() {
    let mut img = page(320);
    for x in [60, 160, 260, 360] {
        draw_ledger(&mut img, x, 80, 3);
        draw_ledger(&mut img, x, 200, 3);
    }
    draw_ledger(&mut img, 460, 80, 6);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)])]);
    let mut params = DetectorParams::default();
    params.stats.enabled = false;

    let report = LedgerDetector::new(params).process(&mut sheet, &img.as_view());

    assert!(report.post_filter.is_none());
    assert_eq!(report.ledger_count(), 9);
}

#[test]
fn stick_is_graded_against_registered_ledgers() {
    let mut img = page(320);
    draw_ledger(&mut img, 100, 80, 3);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)])]);
    let detector = LedgerDetector::default();
    detector.process(&mut sheet, &img.as_view());

    let mut loose = page(320);
    draw_ledger(&mut loose, 105, 60, 3);
    draw_ledger(&mut loose, 500, 60, 3);
    draw_ledger(&mut loose, 300, 140, 3);
    let mut sticks = sticks_of(&loose);
    sticks.sort_by_key(|s| s.bounds.x);
    assert_eq!(sticks.len(), 3);
    let view = loose.as_view();

    let supported = detector
        .evaluate_stick(&sheet, &view, &sticks[0])
        .expect("evaluation");
    assert_eq!((supported.system, supported.staff, supported.index), (1, 1, -2));
    match &supported.verdict {
        StickVerdict::Graded { y_target, impacts } => {
            assert!((y_target - 60.0).abs() < 1e-3);
            assert!(impacts.grade >= 0.5, "{impacts}");
        }
        other => panic!("expected a graded stick, got {other:?}"),
    }

    let inside = detector.evaluate_stick(&sheet, &view, &sticks[1]).expect("evaluation");
    assert_eq!(inside.verdict, StickVerdict::InsideStaff);

    let orphan = detector.evaluate_stick(&sheet, &view, &sticks[2]).expect("evaluation");
    assert_eq!(orphan.index, -2);
    assert_eq!(orphan.verdict, StickVerdict::Orphan);

    // Evaluation never registers anything.
    assert_eq!(sheet.ledger_count(), 1);
    assert_eq!(sticks[0].bounds.w, LEDGER_LENGTH);
}

#[test]
fn small_staff_is_searched_with_its_own_interline() {
    const SMALL: i32 = 14;
    let mut img = page(480);
    draw_ledger(&mut img, 100, 80, 3);
    // Small staff: top line at 300, ledgers one and two small interlines above.
    draw_ledger(&mut img, 100, 300 - SMALL, 3);
    draw_ledger(&mut img, 103, 300 - 2 * SMALL, 3);
    let small = Staff::regular(2, SMALL, STAFF_LEFT, STAFF_RIGHT, 300.0, 5);
    let mut sheet = sheet(vec![system(1, vec![staff(1, 100.0)]), system(2, vec![small])]);
    sheet.scale.small_interline = Some(SMALL);
    let detector = LedgerDetector::default();

    let report = detector.process(&mut sheet, &img.as_view());

    assert!(report.systems.iter().all(|s| s.error.is_none()));
    let regular = &sheet.systems[0].staves[0];
    assert_eq!(regular.ledgers(-1).len(), 1);
    let small = &sheet.systems[1].staves[0];
    assert_eq!(small.ledgers(-1).len(), 1);
    assert_eq!(small.ledgers(-2).len(), 1);
    assert_eq!(small.ledger_count(), 2);
    assert_chained(&sheet);

    let stick = sticks_of(&img)
        .into_iter()
        .find(|s| s.bounds.x == 103)
        .expect("outer small stick");
    let evaluation = detector
        .evaluate_stick(&sheet, &img.as_view(), &stick)
        .expect("evaluation");
    assert_eq!((evaluation.system, evaluation.staff, evaluation.index), (2, 2, -2));
    match &evaluation.verdict {
        StickVerdict::Graded { y_target, impacts } => {
            assert!((y_target - (300 - 2 * SMALL) as f32).abs() < 1e-3);
            assert!(impacts.grade >= 0.5, "{impacts}");
        }
        other => panic!("expected a graded stick, got {other:?}"),
    }
}
