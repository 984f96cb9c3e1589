//! The two explicit driver passes.
//!
//! - [`first_pass`]: runs, sections and per-system ledger search. Systems
//!   are independent and processed in parallel with the `parallel` feature.
//! - [`post_filter_and_rebuild`]: barrier over the whole sheet, then the
//!   statistical discard and a partial re-search of the affected systems.
//!
//! A failing system, whether it returns an error or panics, is logged, left
//! without ledgers and reported; its siblings are unaffected.

use super::params::DetectorParams;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{LineReport, PostFilterStage, RunStage, SystemLedgerStage};
use crate::image::ImageView;
use crate::ledger::stats::{collect_samples, compute_bands, flag_outliers, LedgerSample};
use crate::ledger::{CandidatePool, LedgerError, LedgersBuilder, Suites};
use crate::runs::{
    build_run_table, dispatch_sections, filter_runs, purge_beam_sections, Section, SectionFactory,
};
use crate::sheet::{Sheet, SystemInfo};
use crate::sig::{Inter, InterId};
use crate::sticks::{purge_beam_overlaps, StickFactory};
use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Per-system state kept between the two passes.
#[derive(Clone, Debug)]
pub struct SystemState {
    pub pool: CandidatePool,
    pub stage: SystemLedgerStage,
}

/// Result of [`first_pass`].
#[derive(Clone, Debug)]
pub struct FirstPassOutput {
    pub runs: RunStage,
    /// Indexed like `sheet.systems`.
    pub systems: Vec<SystemState>,
    pub suites: Suites,
    pub elapsed_ms: f64,
}

/// Suites for every interline in use: the sheet scale and each staff.
pub fn build_suites(sheet: &Sheet, params: &DetectorParams) -> Suites {
    let mut interlines: BTreeSet<i32> = sheet.distinct_interlines();
    interlines.insert(sheet.scale.interline);
    interlines.extend(sheet.scale.small_interline);
    Suites::new(interlines.into_iter().filter(|&il| il > 0), &params.ledgers)
}

/// Extract runs and sections, then search ledgers in every system.
pub fn first_pass<I>(sheet: &mut Sheet, image: &I, params: &DetectorParams) -> FirstPassOutput
where
    I: ImageView + Sync,
{
    let start = Instant::now();
    let run_start = Instant::now();
    let table = build_run_table(image);
    let filtered = filter_runs(&table, sheet, &params.runs);
    let mut sections = SectionFactory::build(&filtered);
    if !params.vip_sections.is_empty() {
        for section in &mut sections {
            section.vip = params.vip_sections.contains(&section.id.0);
        }
    }
    let dispatched = dispatch_sections(&sections, sheet, &params.runs);
    let runs = RunStage {
        runs: table.run_count(),
        kept_runs: filtered.run_count(),
        sections: sections.len(),
        elapsed_ms: elapsed_ms(run_start),
    };
    debug!(
        "first_pass runs={} kept={} sections={}",
        runs.runs, runs.kept_runs, runs.sections
    );

    let suites = build_suites(sheet, params);
    let factory = StickFactory::new(&sheet.scale, &params.sticks);
    let scale = &sheet.scale;
    let builder = LedgersBuilder::new(image, scale, &params.ledgers, &suites);

    #[cfg(feature = "parallel")]
    let systems: Vec<SystemState> = sheet
        .systems
        .par_iter_mut()
        .zip(dispatched.into_par_iter())
        .map(|(system, sections)| process_system(system, sections, &factory, &builder))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let systems: Vec<SystemState> = sheet
        .systems
        .iter_mut()
        .zip(dispatched)
        .map(|(system, sections)| process_system(system, sections, &factory, &builder))
        .collect();

    FirstPassOutput {
        runs,
        systems,
        suites,
        elapsed_ms: elapsed_ms(start),
    }
}

fn process_system<I: ImageView>(
    system: &mut SystemInfo,
    sections: Vec<Section>,
    factory: &StickFactory,
    builder: &LedgersBuilder<'_, I>,
) -> SystemState {
    let start = Instant::now();
    let mut stage = SystemLedgerStage {
        system: system.id,
        sections: sections.len(),
        ..SystemLedgerStage::default()
    };
    let mut pool = CandidatePool::default();

    let outcome = guard_system(|| {
        let t = Instant::now();
        let sections = purge_beam_sections(sections, system);
        stage.beam_sections = stage.sections - sections.len();
        let sticks = factory.retrieve_sticks(&sections);
        let (sticks, purged) = purge_beam_overlaps(sticks, &system.good_beams());
        stage.sticks = sticks.len();
        stage.beam_sticks = purged;
        stage.timings.push("sticks", elapsed_ms(t));

        pool = CandidatePool::new(sticks);
        let t = Instant::now();
        let lines = builder.build_ledgers(system, &pool);
        stage.timings.push("ledgers", elapsed_ms(t));
        lines
    });
    match outcome {
        Ok(lines) => stage.lines = lines,
        Err(err) => fail_system(system, &mut stage, &err),
    }
    stage.ledgers = system.staves.iter().map(|s| s.ledger_count()).sum();
    stage.timings.total_ms = elapsed_ms(start);
    debug!(
        "process_system system#{} sticks={} ledgers={}",
        system.id, stage.sticks, stage.ledgers
    );
    SystemState { pool, stage }
}

/// Run the work of one system, turning a panic into a [`LedgerError`] so
/// that it stays confined to that system.
fn guard_system<T>(work: impl FnOnce() -> Result<T, LedgerError>) -> Result<T, LedgerError> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(LedgerError::Panicked { message })
    })
}

fn fail_system(system: &mut SystemInfo, stage: &mut SystemLedgerStage, err: &LedgerError) {
    warn!(
        "Error retrieving ledgers in system#{} ({} staves): {err}",
        system.id,
        system.staves.len()
    );
    system.clear_ledgers();
    stage.error = Some(err.to_string());
}

/// Discard statistical outliers sheet-wide and search the affected sides
/// again.
///
/// For each affected staff side the ledgers are removed from the smallest
/// discarded index outward, since outer ledgers may have used a discarded
/// one as reference. Discarded sticks are banned from the pool and the
/// search resumes at that index.
pub fn post_filter_and_rebuild<I>(
    sheet: &mut Sheet,
    image: &I,
    state: &mut FirstPassOutput,
    params: &DetectorParams,
) -> PostFilterStage
where
    I: ImageView + Sync,
{
    let start = Instant::now();
    if !params.stats.enabled {
        return PostFilterStage::default();
    }

    let samples = collect_samples(sheet, &params.stats);
    let bands = compute_bands(&samples, &params.stats);
    let discarded: Vec<LedgerSample> = flag_outliers(&samples, &bands)
        .into_iter()
        .cloned()
        .collect();
    for s in &discarded {
        info!(
            "post_filter discarding {:?} staff#{} index={} delta={:?} height={:.3} width={:.3}",
            s.inter, s.staff, s.index, s.delta, s.height, s.width
        );
    }

    let mut by_system: BTreeMap<usize, Vec<&LedgerSample>> = BTreeMap::new();
    for s in &discarded {
        by_system.entry(s.system).or_default().push(s);
    }

    let scale = &sheet.scale;
    let builder = LedgersBuilder::new(image, scale, &params.ledgers, &state.suites);
    let rebuild = |(i, (system, st)): (usize, (&mut SystemInfo, &mut SystemState))| {
        let flagged = by_system.get(&i)?;
        let outcome = guard_system(|| rebuild_system(system, &mut st.pool, flagged, &builder));
        let error = match &outcome {
            Ok(_) => None,
            Err(err) => {
                fail_system(system, &mut st.stage, err);
                Some(format!("system#{}: {err}", system.id))
            }
        };
        st.stage.ledgers = system.staves.iter().map(|s| s.ledger_count()).sum();
        Some((system.id, outcome.unwrap_or_default(), error))
    };

    #[cfg(feature = "parallel")]
    let rebuilt: Vec<(u32, Vec<LineReport>, Option<String>)> = sheet
        .systems
        .par_iter_mut()
        .zip(state.systems.par_iter_mut())
        .enumerate()
        .filter_map(rebuild)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let rebuilt: Vec<(u32, Vec<LineReport>, Option<String>)> = sheet
        .systems
        .iter_mut()
        .zip(state.systems.iter_mut())
        .enumerate()
        .filter_map(rebuild)
        .collect();

    let mut stage = PostFilterStage {
        enabled: true,
        population: samples.len(),
        bands,
        discarded,
        ..PostFilterStage::default()
    };
    for (id, lines, error) in rebuilt {
        stage.rebuilt_systems.push(id);
        stage.lines.extend(lines);
        stage.errors.extend(error);
    }
    stage.elapsed_ms = elapsed_ms(start);
    debug!(
        "post_filter_and_rebuild population={} discarded={} rebuilt={:?}",
        stage.population,
        stage.discarded.len(),
        stage.rebuilt_systems
    );
    stage
}

fn rebuild_system<I: ImageView>(
    system: &mut SystemInfo,
    pool: &mut CandidatePool,
    flagged: &[&LedgerSample],
    builder: &LedgersBuilder<'_, I>,
) -> Result<Vec<LineReport>, LedgerError> {
    let banned: BTreeSet<InterId> = flagged.iter().map(|s| s.inter).collect();
    // (staff position, side) -> innermost discarded index.
    let mut starts: BTreeMap<(usize, i32), i32> = BTreeMap::new();
    for s in flagged {
        let staff_idx = system
            .staff_index(s.staff)
            .ok_or(LedgerError::UnknownStaff { staff: s.staff })?;
        starts
            .entry((staff_idx, s.index.signum()))
            .and_modify(|from| {
                if s.index.abs() < from.abs() {
                    *from = s.index;
                }
            })
            .or_insert(s.index);
    }

    let mut lines = Vec::new();
    for ((staff_idx, _), from) in starts {
        let taken = system.staves[staff_idx].take_ledgers_from(from);
        debug!(
            "rebuild_system system#{} staff#{} from={} removed={}",
            system.id,
            system.staves[staff_idx].id,
            from,
            taken.len()
        );
        for (_, id) in taken {
            if let Some(Inter::Ledger(ledger)) = system.sig.remove(id) {
                if banned.contains(&id) {
                    pool.ban(ledger.stick);
                }
            }
        }
        lines.extend(builder.search_side(system, staff_idx, from, pool)?);
    }
    let SystemInfo { staves, sig, .. } = system;
    for staff in staves.iter_mut() {
        staff.refresh_ledger_lines(sig);
    }
    Ok(lines)
}
