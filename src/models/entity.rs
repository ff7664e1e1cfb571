//! Institutional entity models: departments, batches, subjects.
//!
//! These are reference data for one generation run. The engine reads
//! them but never mutates them; creation and deletion belong to the
//! external entity store.

use serde::{Deserialize, Serialize};

/// An academic department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Unique department identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Short code (e.g., "CSE").
    #[serde(default)]
    pub code: String,
}

impl Department {
    /// Creates a department with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            code: String::new(),
        }
    }

    /// Sets the department name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// A batch (class section) scheduled as a unit.
///
/// A batch attends at most one subject per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: String,
    /// Owning department.
    pub department_id: String,
    /// Human-readable name (e.g., "CSE-A").
    #[serde(default)]
    pub name: String,
    /// Semester number.
    #[serde(default)]
    pub semester: u32,
    /// Academic year.
    #[serde(default)]
    pub year: u32,
    /// Number of enrolled students.
    #[serde(default)]
    pub student_count: u32,
}

impl Batch {
    /// Creates a batch owned by a department.
    pub fn new(id: impl Into<String>, department_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            department_id: department_id.into(),
            name: String::new(),
            semester: 1,
            year: 1,
            student_count: 0,
        }
    }

    /// Sets the batch name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the semester number.
    pub fn with_semester(mut self, semester: u32) -> Self {
        self.semester = semester;
        self
    }

    /// Sets the academic year.
    pub fn with_year(mut self, year: u32) -> Self {
        self.year = year;
        self
    }

    /// Sets the student count.
    pub fn with_student_count(mut self, count: u32) -> Self {
        self.student_count = count;
        self
    }
}

/// Kind of subject.
///
/// Practical and lab subjects may be placed as contiguous double periods
/// (see [`crate::config::SearchConfig::double_period_types`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    /// Lecture.
    #[default]
    Theory,
    /// Practical session.
    Practical,
    /// Laboratory session.
    Lab,
}

/// A course offering for one batch, taught by one faculty member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Batch this subject is taught to.
    pub batch_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Course code.
    #[serde(default)]
    pub code: String,
    /// Faculty name; identifies the teaching resource across batches.
    pub faculty: String,
    /// Subject kind.
    #[serde(default)]
    pub subject_type: SubjectType,
    /// Required weekly contact hours (target slot count).
    pub hours_per_week: u32,
}

impl Subject {
    /// Creates a theory subject.
    pub fn new(
        id: impl Into<String>,
        batch_id: impl Into<String>,
        faculty: impl Into<String>,
        hours_per_week: u32,
    ) -> Self {
        Self {
            id: id.into(),
            batch_id: batch_id.into(),
            name: String::new(),
            code: String::new(),
            faculty: faculty.into(),
            subject_type: SubjectType::Theory,
            hours_per_week,
        }
    }

    /// Sets the subject name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the course code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the subject type.
    pub fn with_type(mut self, subject_type: SubjectType) -> Self {
        self.subject_type = subject_type;
        self
    }

    /// Faculty name as used for conflict detection.
    ///
    /// Surrounding whitespace is ignored; comparison is otherwise exact.
    pub fn faculty_key(&self) -> &str {
        self.faculty.trim()
    }
}
