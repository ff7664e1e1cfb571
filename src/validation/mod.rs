//! Input validation and timetable audit.
//!
//! Two gates surround the search:
//! - [`validate_input`] checks the snapshot, grid, and room pool before
//!   any placement. Detects:
//!   - Empty entity lists
//!   - Duplicate IDs
//!   - Dangling department / batch references
//!   - Zero weekly quotas and blank faculty names
//!   - Grids with no addressable slot or ambiguous labels
//!   - Duplicate or blank room IDs
//! - [`audit_timetable`] re-checks every hard constraint on a finished
//!   timetable, independently of the search bookkeeping.

mod audit;

pub use audit::{audit_timetable, AuditResult};

use crate::models::{EntitySnapshot, GridDefinition, RoomPool};
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description naming the offending reference.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No departments, batches, or subjects.
    EmptySnapshot,
    /// Two entities share the same ID.
    DuplicateId,
    /// A batch references a department that doesn't exist.
    UnknownDepartment,
    /// A subject references a batch that doesn't exist.
    UnknownBatch,
    /// A subject requires zero weekly hours.
    InvalidQuota,
    /// A subject has a blank faculty name.
    MissingFaculty,
    /// The grid has no addressable slot.
    EmptyGrid,
    /// The grid has duplicate names or out-of-range settings.
    InvalidGrid,
    /// The room pool has a duplicate or blank room ID.
    InvalidRoom,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates the input of a generation run.
///
/// Checks:
/// 1. Departments, batches, and subjects are all non-empty
/// 2. No duplicate department, batch, or subject IDs
/// 3. Every batch references an existing department
/// 4. Every subject references an existing batch
/// 5. Every subject requires at least one hour and names a faculty
/// 6. The grid and room pool are well-formed
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    snapshot: &EntitySnapshot,
    grid: &GridDefinition,
    rooms: &RoomPool,
) -> ValidationResult {
    let mut errors = Vec::new();

    for (label, empty) in [
        ("departments", snapshot.departments.is_empty()),
        ("batches", snapshot.batches.is_empty()),
        ("subjects", snapshot.subjects.is_empty()),
    ] {
        if empty {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptySnapshot,
                format!("Snapshot has no {label}"),
            ));
        }
    }

    let mut department_ids = HashSet::new();
    for d in &snapshot.departments {
        if !department_ids.insert(d.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate department ID: {}", d.id),
            ));
        }
    }

    let mut batch_ids = HashSet::new();
    for b in &snapshot.batches {
        if !batch_ids.insert(b.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate batch ID: {}", b.id),
            ));
        }
        if !department_ids.contains(b.department_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownDepartment,
                format!(
                    "Batch '{}' references unknown department '{}'",
                    b.id, b.department_id
                ),
            ));
        }
    }

    let mut subject_ids = HashSet::new();
    for s in &snapshot.subjects {
        if !subject_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate subject ID: {}", s.id),
            ));
        }
        if !batch_ids.contains(s.batch_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownBatch,
                format!(
                    "Subject '{}' references unknown batch '{}'",
                    s.id, s.batch_id
                ),
            ));
        }
        if s.hours_per_week == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidQuota,
                format!("Subject '{}' requires zero hours per week", s.id),
            ));
        }
        if s.faculty_key().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingFaculty,
                format!("Subject '{}' has no faculty", s.id),
            ));
        }
    }

    errors.extend(validate_grid(grid));
    errors.extend(validate_rooms(rooms));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that a grid has addressable slots and unambiguous names.
pub fn validate_grid(grid: &GridDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if grid.slot_count() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyGrid,
            format!(
                "Grid has no addressable slot ({} days, {} teaching periods)",
                grid.day_count(),
                grid.periods_per_day()
            ),
        ));
    }

    let mut days = HashSet::new();
    for day in &grid.days {
        if !days.insert(day.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidGrid,
                format!("Duplicate day name: {day}"),
            ));
        }
    }

    let mut labels = HashSet::new();
    for label in grid.period_labels() {
        if !labels.insert(label) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidGrid,
                format!("Duplicate period label: {label}"),
            ));
        }
    }

    if let Some(starts) = &grid.double_starts {
        let per_day = grid.periods_per_day();
        for &p in starts {
            if p + 1 >= per_day {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidGrid,
                    format!("Double-period start {p} has no following period"),
                ));
            }
        }
    }

    errors
}

/// Checks that room IDs are unique and non-blank.
pub fn validate_rooms(rooms: &RoomPool) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for room in rooms.iter() {
        if room.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRoom,
                "Room pool contains a blank room ID",
            ));
        } else if !seen.insert(room) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRoom,
                format!("Duplicate room ID: {room}"),
            ));
        }
    }
    errors
}
