//! Constraint model: hard-constraint checks over a search state.
//!
//! Built once per run from the snapshot, grid, and room pool. Entities
//! are interned to dense indices (batches and subjects in snapshot
//! order, faculties in first-seen order) so every check is a table
//! lookup. The model never mutates state.
//!
//! A placement of `subject` at `start` is legal iff, for every covered
//! slot, the batch is free, the faculty is free, the room (if tracked)
//! is free, and the subject still has enough remaining quota.

use std::collections::HashMap;

use crate::config::SearchConfig;
use crate::error::{EngineError, Result};
use crate::models::{EntitySnapshot, GridDefinition, RoomPool};
use crate::validation::{ValidationError, ValidationErrorKind};

use super::state::{Placement, SearchState};

#[derive(Debug, Clone)]
struct SubjectSpec {
    batch: usize,
    faculty: usize,
    required: u32,
    double: bool,
}

/// Snapshot-scoped hard-constraint evaluator.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    slot_count: usize,
    double_start: Vec<bool>,
    batch_count: usize,
    faculties: Vec<String>,
    room_count: usize,
    subjects: Vec<SubjectSpec>,
    batch_subjects: Vec<Vec<usize>>,
}

impl ConstraintModel {
    /// Builds the model for one run.
    ///
    /// Expects validated input; a subject naming an unknown batch is
    /// still rejected with [`EngineError::Input`].
    pub fn build(
        snapshot: &EntitySnapshot,
        grid: &GridDefinition,
        rooms: &RoomPool,
        search: &SearchConfig,
    ) -> Result<Self> {
        let batch_index: HashMap<&str, usize> = snapshot
            .batches
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.as_str(), i))
            .collect();

        let mut faculty_index: HashMap<&str, usize> = HashMap::new();
        let mut faculties = Vec::new();
        let mut subjects = Vec::with_capacity(snapshot.subjects.len());
        let mut batch_subjects = vec![Vec::new(); snapshot.batches.len()];

        for (i, s) in snapshot.subjects.iter().enumerate() {
            let batch = *batch_index.get(s.batch_id.as_str()).ok_or_else(|| {
                EngineError::Input(vec![ValidationError::new(
                    ValidationErrorKind::UnknownBatch,
                    format!(
                        "Subject '{}' references unknown batch '{}'",
                        s.id, s.batch_id
                    ),
                )])
            })?;
            let key = s.faculty_key();
            let faculty = *faculty_index.entry(key).or_insert_with(|| {
                faculties.push(key.to_string());
                faculties.len() - 1
            });
            subjects.push(SubjectSpec {
                batch,
                faculty,
                required: s.hours_per_week,
                double: search.needs_double_period(s.subject_type),
            });
            batch_subjects[batch].push(i);
        }

        Ok(Self {
            slot_count: grid.slot_count(),
            double_start: grid.double_start_table(),
            batch_count: snapshot.batches.len(),
            faculties,
            room_count: rooms.len(),
            subjects,
            batch_subjects,
        })
    }

    /// Creates an empty search state sized for this model.
    pub fn new_state(&self) -> SearchState {
        SearchState::new(
            self.slot_count,
            self.batch_count,
            self.faculties.len(),
            self.room_count,
            self.subjects.len(),
        )
    }

    /// Number of grid slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of batches.
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Number of subjects.
    #[inline]
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Subjects of a batch, in snapshot order.
    pub fn subjects_of_batch(&self, batch: usize) -> &[usize] {
        &self.batch_subjects[batch]
    }

    /// Faculty name behind a faculty index.
    pub fn faculty_name(&self, faculty: usize) -> Option<&str> {
        self.faculties.get(faculty).map(String::as_str)
    }

    /// Faculty index of a subject.
    #[inline]
    pub fn subject_faculty(&self, subject: usize) -> usize {
        self.subjects[subject].faculty
    }

    /// Weekly hours required by a subject.
    #[inline]
    pub fn required_hours(&self, subject: usize) -> u32 {
        self.subjects[subject].required
    }

    /// Total weekly hours required by a batch.
    pub fn batch_demand(&self, batch: usize) -> u64 {
        self.batch_subjects[batch]
            .iter()
            .map(|&s| u64::from(self.subjects[s].required))
            .sum()
    }

    /// No assignment exists for (batch, slot).
    #[inline]
    pub fn is_batch_free(&self, batch: usize, slot: usize, state: &SearchState) -> bool {
        state.subject_at(batch, slot).is_none()
    }

    /// The faculty member teaches no batch at the slot.
    #[inline]
    pub fn is_faculty_free(&self, faculty: usize, slot: usize, state: &SearchState) -> bool {
        state.faculty_batch_at(faculty, slot).is_none()
    }

    /// No batch holds the room at the slot.
    #[inline]
    pub fn is_room_free(&self, room: usize, slot: usize, state: &SearchState) -> bool {
        state.room_batch_at(room, slot).is_none()
    }

    /// Required hours minus placed hours.
    pub fn remaining_quota(&self, subject: usize, state: &SearchState) -> u32 {
        let required = self.subjects[subject].required;
        let placed = state.placed(subject);
        debug_assert!(placed <= required, "subject placed beyond quota");
        required.saturating_sub(placed)
    }

    /// Length of the next block for a subject: 2 for double-period
    /// subjects with at least two hours left, else 1.
    pub fn block_len(&self, subject: usize, state: &SearchState) -> usize {
        if self.subjects[subject].double && self.remaining_quota(subject, state) >= 2 {
            2
        } else {
            1
        }
    }

    /// First room (pool order) free for every slot of a block.
    ///
    /// `Some(None)` when rooms are not tracked, `None` when no room fits.
    fn room_for(&self, start: usize, len: usize, state: &SearchState) -> Option<Option<usize>> {
        if self.room_count == 0 {
            return Some(None);
        }
        (0..self.room_count)
            .find(|&r| (start..start + len).all(|slot| self.is_room_free(r, slot, state)))
            .map(Some)
    }

    /// Whether a block fits the grid, the batch, and the faculty.
    fn block_fits(&self, batch: usize, faculty: usize, start: usize, len: usize, state: &SearchState) -> bool {
        if start + len > self.slot_count || (len == 2 && !self.double_start[start]) {
            return false;
        }
        (start..start + len).all(|slot| {
            self.is_batch_free(batch, slot, state) && self.is_faculty_free(faculty, slot, state)
        })
    }

    /// Whether a placement is legal in the given state.
    pub fn is_legal(&self, p: &Placement, state: &SearchState) -> bool {
        let Some(spec) = self.subjects.get(p.subject) else {
            return false;
        };
        if p.batch != spec.batch || p.faculty != spec.faculty || p.len == 0 || p.len > 2 {
            return false;
        }
        if self.remaining_quota(p.subject, state) < p.len as u32 {
            return false;
        }
        if !self.block_fits(p.batch, p.faculty, p.start, p.len, state) {
            return false;
        }
        match p.room {
            None => self.room_count == 0,
            Some(room) => {
                room < self.room_count && p.slots().all(|slot| self.is_room_free(room, slot, state))
            }
        }
    }

    /// Legal placements for the subject's next block, in grid order.
    ///
    /// Empty if the quota is met or nothing fits.
    pub fn candidates(&self, subject: usize, state: &SearchState) -> Vec<Placement> {
        if self.remaining_quota(subject, state) == 0 {
            return Vec::new();
        }
        let spec = &self.subjects[subject];
        let len = self.block_len(subject, state);
        (0..self.slot_count)
            .filter(|&start| self.block_fits(spec.batch, spec.faculty, start, len, state))
            .filter_map(|start| {
                self.room_for(start, len, state).map(|room| Placement {
                    subject,
                    batch: spec.batch,
                    faculty: spec.faculty,
                    start,
                    len,
                    room,
                })
            })
            .collect()
    }
}
