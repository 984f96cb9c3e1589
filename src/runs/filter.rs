use super::options::RunFilterOptions;
use super::run::RunTable;
use crate::sheet::Sheet;
use log::debug;

/// Keep only the runs lying far enough from every staff interior.
///
/// The distance is measured from the run center to the closest staff, in
/// pixels of that staff's own interline. Runs with no staff around are
/// kept.
pub fn filter_runs(table: &RunTable, sheet: &Sheet, options: &RunFilterOptions) -> RunTable {
    let mut kept = RunTable::new(table.width(), table.height());
    let mut dropped = 0usize;
    for (y, run) in table.iter() {
        let center = [run.center(), y as f32];
        let keep = match sheet.closest_staff(center) {
            Some(staff) => {
                let min_distance = options.min_distance_from_staff * staff.interline as f32;
                staff.distance_to(center) >= min_distance
            }
            None => true,
        };
        if keep {
            kept.push(y, *run);
        } else {
            dropped += 1;
        }
    }
    debug!(
        "filter_runs kept={} dropped={}",
        kept.run_count(),
        dropped
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::Run;
    use crate::sheet::{Scale, Staff, SystemInfo};

    #[test]
    fn runs_near_or_inside_staff_are_dropped() {
        let staff = Staff::regular(1, 20, 0.0, 400.0, 100.0, 5);
        let sheet = Sheet::new(
            Scale::new(20, 2.0),
            vec![SystemInfo::new(1, 0, 400, vec![staff])],
        );
        let mut table = RunTable::new(400, 300);
        table.push(80, Run::new(100, 30)); // ledger above
        table.push(97, Run::new(100, 30)); // hugging the top line
        table.push(140, Run::new(100, 12)); // inside the staff
        table.push(200, Run::new(100, 30)); // ledger below
        let kept = filter_runs(&table, &sheet, &RunFilterOptions::default());
        assert_eq!(kept.run_count(), 2);
        assert_eq!(kept.row(80).len(), 1);
        assert_eq!(kept.row(200).len(), 1);
    }
}
