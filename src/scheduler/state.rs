//! Search state: the in-progress assignment set of one run.
//!
//! Owned exclusively by the run that created it. Placements are
//! committed and retracted in LIFO order, so the commit log doubles as
//! the undo stack for backtracking.
//!
//! All tables are flat vectors indexed `entity * slot_count + slot`.

use std::ops::Range;

/// A speculative placement of one subject block.
///
/// Covers `len` consecutive slots starting at `start` (linear indices).
/// All indices refer to the owning [`super::ConstraintModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Subject index.
    pub subject: usize,
    /// Batch index.
    pub batch: usize,
    /// Faculty index.
    pub faculty: usize,
    /// First slot.
    pub start: usize,
    /// Number of slots (1, or 2 for a double period).
    pub len: usize,
    /// Reserved room index, if rooms are tracked.
    pub room: Option<usize>,
}

impl Placement {
    /// Slots covered by this placement.
    #[inline]
    pub fn slots(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Occupancy tables for one run.
#[derive(Debug, Clone)]
pub struct SearchState {
    slot_count: usize,
    /// (batch, slot) → subject.
    batch_cells: Vec<Option<usize>>,
    /// (batch, slot) → room.
    batch_rooms: Vec<Option<usize>>,
    /// (faculty, slot) → batch.
    faculty_cells: Vec<Option<usize>>,
    /// (room, slot) → batch.
    room_cells: Vec<Option<usize>>,
    /// Hours placed per subject.
    placed: Vec<u32>,
    log: Vec<Placement>,
}

impl SearchState {
    /// Creates an empty state.
    pub fn new(
        slot_count: usize,
        batches: usize,
        faculties: usize,
        rooms: usize,
        subjects: usize,
    ) -> Self {
        Self {
            slot_count,
            batch_cells: vec![None; batches * slot_count],
            batch_rooms: vec![None; batches * slot_count],
            faculty_cells: vec![None; faculties * slot_count],
            room_cells: vec![None; rooms * slot_count],
            placed: vec![0; subjects],
            log: Vec::new(),
        }
    }

    /// Subject occupying a batch's slot.
    #[inline]
    pub fn subject_at(&self, batch: usize, slot: usize) -> Option<usize> {
        self.batch_cells[batch * self.slot_count + slot]
    }

    /// Room reserved for a batch's slot.
    #[inline]
    pub fn room_at(&self, batch: usize, slot: usize) -> Option<usize> {
        self.batch_rooms[batch * self.slot_count + slot]
    }

    /// Batch a faculty member teaches at a slot.
    #[inline]
    pub fn faculty_batch_at(&self, faculty: usize, slot: usize) -> Option<usize> {
        self.faculty_cells[faculty * self.slot_count + slot]
    }

    /// Batch holding a room at a slot.
    #[inline]
    pub fn room_batch_at(&self, room: usize, slot: usize) -> Option<usize> {
        self.room_cells[room * self.slot_count + slot]
    }

    /// Hours placed for a subject.
    #[inline]
    pub fn placed(&self, subject: usize) -> u32 {
        self.placed[subject]
    }

    /// Number of empty slots in a batch's week.
    pub fn free_slots(&self, batch: usize) -> usize {
        let base = batch * self.slot_count;
        self.batch_cells[base..base + self.slot_count]
            .iter()
            .filter(|c| c.is_none())
            .count()
    }

    /// Committed placements, oldest first.
    pub fn placements(&self) -> &[Placement] {
        &self.log
    }

    /// Number of committed placements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.log.len()
    }

    /// Commits a placement. The caller has checked legality.
    pub fn commit(&mut self, p: Placement) {
        for slot in p.slots() {
            let cell = p.batch * self.slot_count + slot;
            debug_assert!(self.batch_cells[cell].is_none(), "batch slot taken");
            self.batch_cells[cell] = Some(p.subject);
            self.batch_rooms[cell] = p.room;

            let f = p.faculty * self.slot_count + slot;
            debug_assert!(self.faculty_cells[f].is_none(), "faculty slot taken");
            self.faculty_cells[f] = Some(p.batch);

            if let Some(room) = p.room {
                let r = room * self.slot_count + slot;
                debug_assert!(self.room_cells[r].is_none(), "room slot taken");
                self.room_cells[r] = Some(p.batch);
            }
        }
        self.placed[p.subject] += p.len as u32;
        self.log.push(p);
    }

    /// Retracts the most recent placement.
    pub fn retract_last(&mut self) -> Option<Placement> {
        let p = self.log.pop()?;
        for slot in p.slots() {
            let cell = p.batch * self.slot_count + slot;
            self.batch_cells[cell] = None;
            self.batch_rooms[cell] = None;
            self.faculty_cells[p.faculty * self.slot_count + slot] = None;
            if let Some(room) = p.room {
                self.room_cells[room * self.slot_count + slot] = None;
            }
        }
        self.placed[p.subject] -= p.len as u32;
        Some(p)
    }
}
