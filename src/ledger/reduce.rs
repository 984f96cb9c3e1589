use crate::sig::{ExclusionCause, InterId, SIGraph};
use log::debug;
use std::collections::BTreeSet;

/// Resolve abscissa overlaps among the ledgers of one virtual line.
///
/// Ledgers are sorted by left abscissa and each one is only compared with
/// its right neighbours until the first one that does not overlap it. The
/// exclusions are reduced by the graph; deleted ledgers are removed from
/// `ledgers` and returned.
pub fn reduce_ledgers(sig: &mut SIGraph, ledgers: &mut Vec<InterId>) -> BTreeSet<InterId> {
    let left = |sig: &SIGraph, id: InterId| sig.ledger(id).map_or(i32::MAX, |l| l.bounds.x);
    ledgers.sort_by_key(|&id| (left(sig, id), id));

    let mut exclusions = Vec::new();
    for (i, &id) in ledgers.iter().enumerate() {
        let Some(bounds) = sig.ledger(id).map(|l| l.bounds) else {
            continue;
        };
        for &other in &ledgers[i + 1..] {
            let Some(other_bounds) = sig.ledger(other).map(|l| l.bounds) else {
                continue;
            };
            if bounds.x_overlap(&other_bounds) > 0 {
                exclusions.push(sig.insert_exclusion(id, other, ExclusionCause::Overlap));
            } else {
                break;
            }
        }
    }
    if exclusions.is_empty() {
        return BTreeSet::new();
    }

    let deleted = sig.reduce_exclusions(&exclusions);
    debug!(
        "reduce_ledgers exclusions={} deletions={:?}",
        exclusions.len(),
        deleted
    );
    ledgers.retain(|id| !deleted.contains(id));
    deleted
}
