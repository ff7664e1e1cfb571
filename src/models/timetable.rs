//! Timetable (solution) model.
//!
//! A timetable is the terminal artifact of one generation run: the flat
//! assignment set, the per-batch lookup built from it, the completeness
//! report, and the snapshot and grid it was generated from. It is never
//! mutated after construction; a new run produces a new timetable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EntitySnapshot, GridDefinition, RoomPool, TimeSlot};

/// Placement of one subject into one slot for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Batch attending.
    pub batch_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Faculty teaching (denormalized from the subject).
    pub faculty: String,
    /// Reserved room, if room tracking is enabled.
    pub room_id: Option<String>,
    /// Grid cell.
    pub slot: TimeSlot,
}

impl Assignment {
    /// Creates an assignment without a room.
    pub fn new(
        batch_id: impl Into<String>,
        subject_id: impl Into<String>,
        faculty: impl Into<String>,
        slot: TimeSlot,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            subject_id: subject_id.into(),
            faculty: faculty.into(),
            room_id: None,
            slot,
        }
    }

    /// Attaches a room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }
}

/// Contents of one filled cell in a batch's weekly view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCell {
    /// Subject ID.
    pub subject_id: String,
    /// Subject display name.
    pub subject_name: String,
    /// Faculty name.
    pub faculty: String,
    /// Room, if tracked.
    pub room_id: Option<String>,
}

/// One period of a day in a batch's weekly view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Period label.
    pub label: String,
    /// `None` = free period.
    pub cell: Option<ScheduleCell>,
}

/// One day column of a batch's weekly view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Day name.
    pub day: String,
    /// Teaching periods in grid order.
    pub slots: Vec<SlotEntry>,
}

/// Weekly view of one batch: day → period → cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTimetable {
    /// Batch ID.
    pub batch_id: String,
    /// Batch display name.
    pub batch_name: String,
    /// Owning department.
    pub department_id: String,
    /// Semester number.
    pub semester: u32,
    /// Days in grid order.
    pub days: Vec<DaySchedule>,
}

impl BatchTimetable {
    /// Cell at a day name and period label (`None` if free or unknown).
    pub fn get(&self, day: &str, label: &str) -> Option<&ScheduleCell> {
        self.days
            .iter()
            .find(|d| d.day == day)?
            .slots
            .iter()
            .find(|s| s.label == label)?
            .cell
            .as_ref()
    }

    /// Number of filled cells.
    pub fn filled_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| s.cell.is_some())
            .count()
    }
}

/// Unmet weekly quota for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    /// Subject ID.
    pub subject_id: String,
    /// Batch the subject belongs to.
    pub batch_id: String,
    /// Required weekly hours.
    pub required_hours: u32,
    /// Hours actually placed.
    pub placed_hours: u32,
    /// `required_hours - placed_hours`.
    pub shortfall_hours: u32,
}

impl Shortfall {
    /// Creates a shortfall entry. `placed` must be below `required`.
    pub fn new(
        subject_id: impl Into<String>,
        batch_id: impl Into<String>,
        required: u32,
        placed: u32,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            batch_id: batch_id.into(),
            required_hours: required,
            placed_hours: placed,
            shortfall_hours: required.saturating_sub(placed),
        }
    }
}

/// Subjects whose quota could not be met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// Shortfalls in snapshot subject order.
    pub shortfalls: Vec<Shortfall>,
}

impl CompletenessReport {
    /// Whether every quota was met.
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }

    /// Shortfall entry for a subject.
    pub fn shortfall_for(&self, subject_id: &str) -> Option<&Shortfall> {
        self.shortfalls.iter().find(|s| s.subject_id == subject_id)
    }

    /// Sum of missing hours.
    pub fn total_shortfall_hours(&self) -> u64 {
        self.shortfalls
            .iter()
            .map(|s| u64::from(s.shortfall_hours))
            .sum()
    }
}

/// An invariant breach found by the timetable audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Offending entity (batch, faculty, room, or subject).
    pub entity_id: String,
    /// Offending slot, when the breach is slot-specific.
    pub slot: Option<TimeSlot>,
    /// Human-readable description.
    pub message: String,
}

/// Classification of timetable violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two assignments for one (batch, slot).
    BatchDoubleBooked,
    /// Two assignments for one (faculty, slot).
    FacultyDoubleBooked,
    /// Two assignments for one (room, slot).
    RoomDoubleBooked,
    /// A subject placed more often than its weekly hours.
    QuotaExceeded,
    /// Completeness report disagrees with the placed counts.
    ShortfallMismatch,
    /// An assignment references an entity absent from the snapshot.
    DanglingReference,
    /// An assignment addresses a cell outside the grid.
    SlotOutOfGrid,
    /// Missing room, or a room not in the pool.
    InvalidRoom,
}

impl Violation {
    /// Creates a violation tied to a slot.
    pub fn at_slot(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        slot: TimeSlot,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            slot: Some(slot),
            message: message.into(),
        }
    }

    /// Creates a violation not tied to a slot.
    pub fn for_entity(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            slot: None,
            message: message.into(),
        }
    }
}

/// A generated weekly timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    generated_at: DateTime<Utc>,
    snapshot: EntitySnapshot,
    grid: GridDefinition,
    rooms: RoomPool,
    assignments: Vec<Assignment>,
    schedule: BTreeMap<String, BatchTimetable>,
    completeness: CompletenessReport,
}

impl Timetable {
    /// Assembles a timetable. Used by the schedule builder.
    pub(crate) fn from_parts(
        generated_at: DateTime<Utc>,
        snapshot: EntitySnapshot,
        grid: GridDefinition,
        rooms: RoomPool,
        assignments: Vec<Assignment>,
        schedule: BTreeMap<String, BatchTimetable>,
        completeness: CompletenessReport,
    ) -> Self {
        Self {
            generated_at,
            snapshot,
            grid,
            rooms,
            assignments,
            schedule,
            completeness,
        }
    }

    /// Generation timestamp.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Snapshot the timetable was built from.
    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    /// Grid the timetable was built on.
    pub fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    /// Room pool used (empty if rooms were not tracked).
    pub fn rooms(&self) -> &RoomPool {
        &self.rooms
    }

    /// Flat assignment set, ordered by batch (snapshot order) then slot.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Per-batch weekly views keyed by batch ID.
    pub fn schedule(&self) -> &BTreeMap<String, BatchTimetable> {
        &self.schedule
    }

    /// Weekly view of one batch.
    pub fn batch(&self, batch_id: &str) -> Option<&BatchTimetable> {
        self.schedule.get(batch_id)
    }

    /// Cell lookup: batch → day → period label.
    pub fn cell(&self, batch_id: &str, day: &str, label: &str) -> Option<&ScheduleCell> {
        self.batch(batch_id)?.get(day, label)
    }

    /// Completeness report.
    pub fn completeness(&self) -> &CompletenessReport {
        &self.completeness
    }

    /// Whether every subject met its weekly quota.
    pub fn is_complete(&self) -> bool {
        self.completeness.is_complete()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Hours placed for a subject.
    pub fn placed_hours(&self, subject_id: &str) -> u32 {
        self.assignments
            .iter()
            .filter(|a| a.subject_id == subject_id)
            .count() as u32
    }

    /// Returns all assignments for a given batch.
    pub fn assignments_for_batch(&self, batch_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.batch_id == batch_id)
            .collect()
    }

    /// Returns all assignments taught by a faculty member.
    pub fn assignments_for_faculty(&self, faculty: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.faculty.trim() == faculty.trim())
            .collect()
    }

    /// Number of departments in the source snapshot.
    pub fn department_count(&self) -> usize {
        self.snapshot.departments.len()
    }

    /// Number of batches in the source snapshot.
    pub fn batch_count(&self) -> usize {
        self.snapshot.batches.len()
    }

    /// Number of subjects in the source snapshot.
    pub fn subject_count(&self) -> usize {
        self.snapshot.subjects.len()
    }
}
