//! Constructive assignment search with bounded backtracking.
//!
//! # Algorithm
//!
//! 1. Order batches by total weekly demand (descending, snapshot order on ties).
//! 2. Within a batch, repeatedly pick the open subject with the highest
//!    remaining-quota / legal-candidate ratio (most constrained first;
//!    a subject with no candidate is picked immediately).
//! 3. Commit its first legal candidate in grid order and push a decision
//!    frame holding the remaining alternatives.
//! 4. On a dead end, retract the most recent decision of the batch and
//!    commit its next alternative, popping further while none is left.
//! 5. Once the batch's backtrack budget is spent (or the batch has no
//!    free slot left, or no decision to undo) the state is rewound to the
//!    dead end with the most placed hours since the last give-up. That
//!    dead end's subject keeps its shortfall, and the restored decisions
//!    become final. A larger budget never places fewer hours than the
//!    first dead end held.
//!
//! # Complexity
//! Each step evaluates at most subjects × slots candidates. Retractions
//! are bounded by `backtrack_budget` per batch and forward steps by the
//! batch's total quota, so the search terminates on any input.
//!
//! # Determinism
//! No randomness: orderings, tie-breaks, and room choice (first free in
//! pool order) depend only on the input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::error::{EngineError, Result};

use super::constraints::ConstraintModel;
use super::state::{Placement, SearchState};

/// Shared stop flag for a running search.
///
/// Cloning shares the flag. Raising it makes the search return
/// [`EngineError::Cancelled`] at its next step, leaving no side effects.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a lowered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether the flag is raised.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Search counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Committed placements, including re-commits after backtracking.
    pub placements: usize,
    /// Retracted placements.
    pub backtracks: usize,
    /// Slot positions examined while enumerating candidates.
    pub evaluations: usize,
    /// Subjects left below quota.
    pub abandoned: usize,
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Final occupancy.
    pub state: SearchState,
    /// Counters.
    pub stats: SearchStats,
    /// Subjects given up on, in the order they were abandoned.
    pub abandoned: Vec<usize>,
}

struct Frame {
    candidates: Vec<Placement>,
    chosen: usize,
}

/// Batch placements (above the give-up checkpoint) at a dead end.
struct DeadEnd {
    local: usize,
    hours: usize,
    placements: Vec<Placement>,
}

enum Selection {
    Place(Vec<Placement>),
    DeadEnd(usize),
    Done,
}

/// Most-constrained-first placement search with bounded backtracking.
#[derive(Debug, Clone)]
pub struct AssignmentSearch<'a> {
    model: &'a ConstraintModel,
    backtrack_budget: usize,
    cancel: CancellationToken,
}

impl<'a> AssignmentSearch<'a> {
    /// Creates a search over a constraint model.
    pub fn new(model: &'a ConstraintModel, config: &SearchConfig) -> Self {
        Self {
            model,
            backtrack_budget: config.backtrack_budget,
            cancel: CancellationToken::new(),
        }
    }

    /// Observes an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the search to completion.
    ///
    /// Never fails on infeasible input: unmet quotas remain in the state.
    /// Fails only with [`EngineError::Cancelled`].
    pub fn run(&self) -> Result<SearchOutcome> {
        let mut state = self.model.new_state();
        let mut stats = SearchStats::default();
        let mut abandoned = Vec::new();

        for batch in self.batch_order() {
            self.place_batch(batch, &mut state, &mut stats, &mut abandoned)?;
        }

        stats.abandoned = abandoned.len();
        Ok(SearchOutcome {
            state,
            stats,
            abandoned,
        })
    }

    /// Batch indices by descending demand; stable on ties.
    fn batch_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.model.batch_count()).collect();
        order.sort_by_key(|&b| std::cmp::Reverse(self.model.batch_demand(b)));
        order
    }

    fn place_batch(
        &self,
        batch: usize,
        state: &mut SearchState,
        stats: &mut SearchStats,
        abandoned: &mut Vec<usize>,
    ) -> Result<()> {
        let subjects = self.model.subjects_of_batch(batch);
        let mut given_up = vec![false; subjects.len()];
        let mut frames: Vec<Frame> = Vec::new();
        let mut backtracks = 0usize;
        let mut base = state.depth();
        let mut best: Option<DeadEnd> = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            match self.select(subjects, &given_up, state, stats) {
                Selection::Done => break,
                Selection::Place(candidates) => {
                    let p = candidates[0];
                    state.commit(p);
                    stats.placements += 1;
                    trace!(batch, subject = p.subject, start = p.start, len = p.len, room = ?p.room, "placed");
                    frames.push(Frame {
                        candidates,
                        chosen: 0,
                    });
                }
                Selection::DeadEnd(local) => {
                    let hours: usize = state.placements()[base..].iter().map(|p| p.len).sum();
                    if best.as_ref().map_or(true, |b| hours > b.hours) {
                        best = Some(DeadEnd {
                            local,
                            hours,
                            placements: state.placements()[base..].to_vec(),
                        });
                    }

                    let retry = backtracks < self.backtrack_budget
                        && !frames.is_empty()
                        && state.free_slots(batch) > 0;
                    if retry && self.backtrack(&mut frames, state, &mut backtracks, stats) {
                        continue;
                    }

                    // Resume from the fullest dead end seen since the last give-up.
                    let local = match best.take() {
                        Some(dead_end) => {
                            self.restore(state, base, &dead_end.placements, stats);
                            dead_end.local
                        }
                        None => local,
                    };
                    let subject = subjects[local];
                    debug!(
                        batch,
                        subject,
                        remaining = self.model.remaining_quota(subject, state),
                        backtracks,
                        "subject abandoned below quota"
                    );
                    given_up[local] = true;
                    abandoned.push(subject);
                    frames.clear();
                    base = state.depth();
                }
            }
        }

        stats.backtracks += backtracks;
        debug!(
            batch,
            demand = self.model.batch_demand(batch),
            free_slots = state.free_slots(batch),
            backtracks,
            "batch placed"
        );
        Ok(())
    }

    /// Picks the next subject to place, or reports a dead end.
    fn select(
        &self,
        subjects: &[usize],
        given_up: &[bool],
        state: &SearchState,
        stats: &mut SearchStats,
    ) -> Selection {
        let mut best: Option<(u32, Vec<Placement>)> = None;

        for (local, &subject) in subjects.iter().enumerate() {
            if given_up[local] {
                continue;
            }
            let remaining = self.model.remaining_quota(subject, state);
            if remaining == 0 {
                continue;
            }
            let candidates = self.model.candidates(subject, state);
            stats.evaluations += self.model.slot_count();
            if candidates.is_empty() {
                return Selection::DeadEnd(local);
            }
            // remaining / |candidates| > best_remaining / |best_candidates|
            let tighter = match &best {
                None => true,
                Some((best_remaining, best_candidates)) => {
                    u64::from(remaining) * best_candidates.len() as u64
                        > u64::from(*best_remaining) * candidates.len() as u64
                }
            };
            if tighter {
                best = Some((remaining, candidates));
            }
        }

        match best {
            Some((_, candidates)) => Selection::Place(candidates),
            None => Selection::Done,
        }
    }

    /// Rewinds the state to `base` and replays `placements` on top.
    fn restore(
        &self,
        state: &mut SearchState,
        base: usize,
        placements: &[Placement],
        stats: &mut SearchStats,
    ) {
        if state.placements()[base..] == *placements {
            return;
        }
        while state.depth() > base {
            if let Some(p) = state.retract_last() {
                trace!(subject = p.subject, start = p.start, "retracted");
            }
        }
        for &p in placements {
            debug_assert!(self.model.is_legal(&p, state), "replayed placement is illegal");
            state.commit(p);
            stats.placements += 1;
        }
    }

    /// Undoes decisions until one has an untried alternative, then
    /// commits it. Returns `false` if the stack or budget runs out first.
    fn backtrack(
        &self,
        frames: &mut Vec<Frame>,
        state: &mut SearchState,
        backtracks: &mut usize,
        stats: &mut SearchStats,
    ) -> bool {
        while *backtracks < self.backtrack_budget {
            let Some(mut frame) = frames.pop() else {
                return false;
            };
            if let Some(p) = state.retract_last() {
                trace!(subject = p.subject, start = p.start, "retracted");
            }
            *backtracks += 1;

            let next = (frame.chosen + 1..frame.candidates.len())
                .find(|&i| self.model.is_legal(&frame.candidates[i], state));
            if let Some(i) = next {
                state.commit(frame.candidates[i]);
                stats.placements += 1;
                frame.chosen = i;
                frames.push(frame);
                return true;
            }
        }
        false
    }
}
