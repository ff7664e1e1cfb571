//! Schedule builder: search state → timetable.
//!
//! Expands every committed placement into one assignment per covered
//! slot, derives the per-batch weekly lookup, and computes the
//! completeness report from placed vs required hours.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{
    Assignment, BatchTimetable, CompletenessReport, DaySchedule, EntitySnapshot, GridDefinition,
    RoomPool, ScheduleCell, Shortfall, SlotEntry, Timetable,
};

use super::state::SearchState;

/// Assembles the timetable of one run.
///
/// Indices in the search state refer to snapshot order (batches and
/// subjects) and pool order (rooms).
#[derive(Debug, Clone, Copy)]
pub struct ScheduleBuilder<'a> {
    snapshot: &'a EntitySnapshot,
    grid: &'a GridDefinition,
    rooms: &'a RoomPool,
}

impl<'a> ScheduleBuilder<'a> {
    /// Creates a builder over the run's inputs.
    pub fn new(snapshot: &'a EntitySnapshot, grid: &'a GridDefinition, rooms: &'a RoomPool) -> Self {
        Self {
            snapshot,
            grid,
            rooms,
        }
    }

    /// Builds the timetable from a finished search state.
    pub fn build(&self, state: &SearchState, generated_at: DateTime<Utc>) -> Timetable {
        let assignments = self.assignments(state);
        let schedule = self.lookup(&assignments);
        let completeness = self.completeness(state);

        Timetable::from_parts(
            generated_at,
            self.snapshot.clone(),
            self.grid.clone(),
            self.rooms.clone(),
            assignments,
            schedule,
            completeness,
        )
    }

    /// One assignment per occupied slot, ordered by batch then slot.
    fn assignments(&self, state: &SearchState) -> Vec<Assignment> {
        let mut keyed: Vec<(usize, usize, Assignment)> = Vec::new();

        for p in state.placements() {
            let (Some(batch), Some(subject)) = (
                self.snapshot.batches.get(p.batch),
                self.snapshot.subjects.get(p.subject),
            ) else {
                continue;
            };
            let room = p.room.and_then(|r| self.rooms.get(r));
            for index in p.slots() {
                let Some(slot) = self.grid.slot_at(index) else {
                    continue;
                };
                let mut a = Assignment::new(&batch.id, &subject.id, subject.faculty_key(), slot);
                if let Some(room) = room {
                    a = a.with_room(room);
                }
                keyed.push((p.batch, index, a));
            }
        }

        keyed.sort_by_key(|(batch, index, _)| (*batch, *index));
        keyed.into_iter().map(|(_, _, a)| a).collect()
    }

    /// Per-batch weekly views: batch → day → period label → cell.
    ///
    /// Every snapshot batch gets a view, with every teaching period of
    /// the grid present (free periods hold `None`).
    pub fn lookup(&self, assignments: &[Assignment]) -> BTreeMap<String, BatchTimetable> {
        let labels = self.grid.period_labels();
        let mut schedule: BTreeMap<String, BatchTimetable> = self
            .snapshot
            .batches
            .iter()
            .map(|b| {
                let days = self
                    .grid
                    .days
                    .iter()
                    .map(|day| DaySchedule {
                        day: day.clone(),
                        slots: labels
                            .iter()
                            .map(|label| SlotEntry {
                                label: (*label).to_string(),
                                cell: None,
                            })
                            .collect(),
                    })
                    .collect();
                let view = BatchTimetable {
                    batch_id: b.id.clone(),
                    batch_name: b.name.clone(),
                    department_id: b.department_id.clone(),
                    semester: b.semester,
                    days,
                };
                (b.id.clone(), view)
            })
            .collect();

        for a in assignments {
            let Some(view) = schedule.get_mut(&a.batch_id) else {
                continue;
            };
            let Some(entry) = view
                .days
                .get_mut(a.slot.day)
                .and_then(|d| d.slots.get_mut(a.slot.period))
            else {
                continue;
            };
            let subject_name = match self.snapshot.subject(&a.subject_id) {
                Some(s) if !s.name.is_empty() => s.name.clone(),
                _ => a.subject_id.clone(),
            };
            entry.cell = Some(ScheduleCell {
                subject_id: a.subject_id.clone(),
                subject_name,
                faculty: a.faculty.clone(),
                room_id: a.room_id.clone(),
            });
        }

        schedule
    }

    /// Shortfalls in snapshot subject order.
    fn completeness(&self, state: &SearchState) -> CompletenessReport {
        let shortfalls = self
            .snapshot
            .subjects
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let placed = state.placed(i);
                if placed >= s.hours_per_week {
                    return None;
                }
                warn!(
                    subject = %s.id,
                    batch = %s.batch_id,
                    required = s.hours_per_week,
                    placed,
                    "weekly quota not met"
                );
                Some(Shortfall::new(&s.id, &s.batch_id, s.hours_per_week, placed))
            })
            .collect();

        CompletenessReport { shortfalls }
    }
}
