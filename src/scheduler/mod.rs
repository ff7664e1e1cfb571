//! Timetable construction and KPI evaluation.
//!
//! A run flows through four stages:
//!
//! 1. [`ConstraintModel`] interns the snapshot into dense indices and
//!    answers hard-constraint queries (batch, faculty, room, quota).
//! 2. [`AssignmentSearch`] places subject hours into a [`SearchState`],
//!    most constrained subject first, with bounded backtracking.
//! 3. [`ScheduleBuilder`] turns the final state into a [`Timetable`]
//!    with its per-batch lookup and completeness report.
//! 4. [`TimetableKpi`] summarizes coverage and load.
//!
//! # Algorithm
//!
//! The search is constructive and deterministic. It is not optimal: when
//! a quota cannot be met within the backtrack budget the subject is left
//! with a shortfall instead of failing the run.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent Research Directions in Automated Timetabling"
//!
//! [`Timetable`]: crate::models::Timetable

mod builder;
mod constraints;
mod kpi;
mod search;
mod state;

pub use builder::ScheduleBuilder;
pub use constraints::ConstraintModel;
pub use kpi::TimetableKpi;
pub use search::{AssignmentSearch, CancellationToken, SearchOutcome, SearchStats};
pub use state::{Placement, SearchState};
