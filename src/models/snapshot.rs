//! Entity snapshot: the input of one generation run.
//!
//! Captured once before a run starts and read-only for its duration.
//! Passing the snapshot explicitly (instead of reading shared entity
//! lists) keeps concurrent runs independent.

use serde::{Deserialize, Serialize};

use super::{Batch, Department, Subject};

/// Departments, batches, and subjects for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Departments.
    #[serde(default)]
    pub departments: Vec<Department>,
    /// Batches.
    #[serde(default)]
    pub batches: Vec<Batch>,
    /// Subjects.
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl EntitySnapshot {
    /// Creates a snapshot from entity lists.
    pub fn new(departments: Vec<Department>, batches: Vec<Batch>, subjects: Vec<Subject>) -> Self {
        Self {
            departments,
            batches,
            subjects,
        }
    }

    /// Adds a department.
    pub fn with_department(mut self, department: Department) -> Self {
        self.departments.push(department);
        self
    }

    /// Adds a batch.
    pub fn with_batch(mut self, batch: Batch) -> Self {
        self.batches.push(batch);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Finds a department by ID.
    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    /// Finds a batch by ID.
    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    /// Finds a subject by ID.
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Subjects taught to a batch, in snapshot order.
    pub fn subjects_for_batch(&self, batch_id: &str) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| s.batch_id == batch_id)
            .collect()
    }

    /// Total required weekly hours across all subjects.
    pub fn total_required_hours(&self) -> u64 {
        self.subjects.iter().map(|s| u64::from(s.hours_per_week)).sum()
    }

    /// Whether any of the three entity lists is empty.
    pub fn is_incomplete(&self) -> bool {
        self.departments.is_empty() || self.batches.is_empty() || self.subjects.is_empty()
    }
}
