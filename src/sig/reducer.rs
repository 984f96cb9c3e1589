use super::graph::{Exclusion, SIGraph};
use super::inter::InterId;
use std::collections::BTreeSet;
use std::fmt;

/// Policy deciding which interpretations lose their exclusions.
///
/// Implementations only report the deletions; the graph removes them.
pub trait ExclusionReducer: fmt::Debug + Send + Sync {
    fn reduce(&self, sig: &SIGraph, exclusions: &[Exclusion]) -> Vec<InterId>;
}

/// Greedy grade-driven reduction.
///
/// Repeatedly picks the live exclusion whose stronger end has the highest
/// grade and deletes its weaker end (the target on equal grades), until no
/// exclusion has both ends alive.
#[derive(Clone, Copy, Debug, Default)]
pub struct GradeReducer;

impl ExclusionReducer for GradeReducer {
    fn reduce(&self, sig: &SIGraph, exclusions: &[Exclusion]) -> Vec<InterId> {
        let grade = |id: InterId| sig.inter(id).map(|i| i.grade()).unwrap_or(0.0);
        let mut live: Vec<&Exclusion> = exclusions
            .iter()
            .filter(|e| sig.contains_exclusion(e))
            .collect();
        let mut removed: BTreeSet<InterId> = BTreeSet::new();
        let mut order = Vec::new();

        loop {
            live.retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
            let best = live.iter().copied().fold(None::<(&Exclusion, f32)>, |acc, e| {
                let cp = grade(e.source).max(grade(e.target));
                match acc {
                    Some((_, best_cp)) if best_cp >= cp => acc,
                    _ => Some((e, cp)),
                }
            });
            let Some((rel, _)) = best else {
                break;
            };
            let weaker = if grade(rel.source) < grade(rel.target) {
                rel.source
            } else {
                rel.target
            };
            removed.insert(weaker);
            order.push(weaker);
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig::{BeamInter, ExclusionCause, Inter};

    fn add(sig: &mut SIGraph, grade: f32) -> InterId {
        sig.add_vertex(Inter::Beam(BeamInter::from_median(
            [0.0, 0.0],
            [10.0, 0.0],
            4.0,
            grade,
        )))
    }

    #[test]
    fn chain_keeps_both_ends_when_middle_is_weakest() {
        let mut sig = SIGraph::new();
        let a = add(&mut sig, 0.9);
        let b = add(&mut sig, 0.5);
        let c = add(&mut sig, 0.8);
        let ex = vec![
            sig.insert_exclusion(a, b, ExclusionCause::Overlap),
            sig.insert_exclusion(b, c, ExclusionCause::Overlap),
        ];
        assert_eq!(GradeReducer.reduce(&sig, &ex), vec![b]);
    }

    #[test]
    fn strongest_wins_over_chain() {
        let mut sig = SIGraph::new();
        let a = add(&mut sig, 0.6);
        let b = add(&mut sig, 0.9);
        let c = add(&mut sig, 0.7);
        let ex = vec![
            sig.insert_exclusion(a, b, ExclusionCause::Overlap),
            sig.insert_exclusion(b, c, ExclusionCause::Overlap),
        ];
        let deleted = GradeReducer.reduce(&sig, &ex);
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&a) && deleted.contains(&c));
    }

    #[test]
    fn equal_grades_delete_target() {
        let mut sig = SIGraph::new();
        let a = add(&mut sig, 0.7);
        let b = add(&mut sig, 0.7);
        let ex = vec![sig.insert_exclusion(a, b, ExclusionCause::Overlap)];
        assert_eq!(GradeReducer.reduce(&sig, &ex), vec![b]);
    }
}
