use super::inter::{Inter, InterId, LedgerInter};
use super::reducer::{ExclusionReducer, GradeReducer};
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Why two interpretations exclude each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionCause {
    Overlap,
}

/// Symmetric "at most one survives" edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Exclusion {
    pub source: InterId,
    pub target: InterId,
    pub cause: ExclusionCause,
}

impl Exclusion {
    pub fn touches(&self, id: InterId) -> bool {
        self.source == id || self.target == id
    }

    fn same_pair(&self, a: InterId, b: InterId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Symbolic interpretation graph of one system.
///
/// Vertices are never reindexed: a removed interpretation leaves a hole so
/// that outstanding [`InterId`]s stay valid (and resolve to `None`).
#[derive(Clone)]
pub struct SIGraph {
    vertices: Vec<Option<Inter>>,
    exclusions: Vec<Exclusion>,
    reducer: Arc<dyn ExclusionReducer>,
}

impl Default for SIGraph {
    fn default() -> Self {
        Self::with_reducer(Arc::new(GradeReducer))
    }
}

impl fmt::Debug for SIGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SIGraph")
            .field("vertices", &self.len())
            .field("exclusions", &self.exclusions.len())
            .field("reducer", &self.reducer)
            .finish()
    }
}

impl SIGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph whose exclusion reduction is delegated to `reducer`.
    pub fn with_reducer(reducer: Arc<dyn ExclusionReducer>) -> Self {
        Self {
            vertices: Vec::new(),
            exclusions: Vec::new(),
            reducer,
        }
    }

    pub fn add_vertex(&mut self, inter: Inter) -> InterId {
        let id = InterId(self.vertices.len() as u32);
        self.vertices.push(Some(inter));
        id
    }

    pub fn contains(&self, id: InterId) -> bool {
        self.inter(id).is_some()
    }

    pub fn inter(&self, id: InterId) -> Option<&Inter> {
        self.vertices.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn ledger(&self, id: InterId) -> Option<&LedgerInter> {
        self.inter(id).and_then(Inter::as_ledger)
    }

    pub fn ledger_mut(&mut self, id: InterId) -> Option<&mut LedgerInter> {
        self.vertices
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .and_then(Inter::as_ledger_mut)
    }

    /// Live vertex count.
    pub fn len(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every live interpretation matching `predicate`, in insertion order.
    pub fn inters<P>(&self, predicate: P) -> Vec<InterId>
    where
        P: Fn(&Inter) -> bool,
    {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match v {
                Some(inter) if predicate(inter) => Some(InterId(i as u32)),
                _ => None,
            })
            .collect()
    }

    /// Insert (or retrieve) the exclusion between `a` and `b`.
    pub fn insert_exclusion(&mut self, a: InterId, b: InterId, cause: ExclusionCause) -> Exclusion {
        if let Some(existing) = self.exclusions.iter().find(|e| e.same_pair(a, b)) {
            return *existing;
        }
        let exclusion = Exclusion {
            source: a,
            target: b,
            cause,
        };
        self.exclusions.push(exclusion);
        exclusion
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// `true` while the edge and both of its ends are still in the graph.
    pub fn contains_exclusion(&self, exclusion: &Exclusion) -> bool {
        self.contains(exclusion.source)
            && self.contains(exclusion.target)
            && self.exclusions.iter().any(|e| e == exclusion)
    }

    /// Remove a vertex together with its edges.
    pub fn remove(&mut self, id: InterId) -> Option<Inter> {
        let removed = self.vertices.get_mut(id.0 as usize).and_then(Option::take);
        if removed.is_some() {
            self.exclusions.retain(|e| !e.touches(id));
        }
        removed
    }

    /// Resolve `exclusions` with the injected reducer, removing the losers.
    pub fn reduce_exclusions(&mut self, exclusions: &[Exclusion]) -> BTreeSet<InterId> {
        let deletions = self.reducer.reduce(self, exclusions);
        let mut removed = BTreeSet::new();
        for id in deletions {
            if let Some(inter) = self.remove(id) {
                if inter.is_vip() {
                    log::info!("SIGraph::reduce_exclusions VIP deleting {:?}", id);
                }
                removed.insert(id);
            }
        }
        debug!(
            "SIGraph::reduce_exclusions exclusions={} deleted={}",
            exclusions.len(),
            removed.len()
        );
        removed
    }
}
