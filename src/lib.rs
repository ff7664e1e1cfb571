//! Academic timetable generation.
//!
//! Places weekly subject hours for every batch of an institution into a
//! fixed day × period grid such that no batch, faculty member, or room
//! is booked twice in the same slot. Quotas that cannot be met are
//! reported as shortfalls instead of failing the run.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `GridDefinition`, `Department`, `Batch`,
//!   `Subject`, `EntitySnapshot`, `RoomPool`, `Timetable`
//! - **`validation`**: Input integrity checks and the post-hoc timetable audit
//! - **`scheduler`**: Constraint model, assignment search, schedule builder, KPIs
//! - **`generator`**: Run orchestration, including the async timeout worker
//! - **`config`**: Engine configuration
//! - **`error`**: Engine error type
//!
//! # Example
//!
//! ```
//! use u_timetable::TimetableGenerator;
//! use u_timetable::models::{Batch, Department, EntitySnapshot, Subject, SubjectType};
//!
//! let snapshot = EntitySnapshot::default()
//!     .with_department(Department::new("CSE").with_name("Computer Science"))
//!     .with_batch(Batch::new("CSE-A", "CSE").with_semester(3))
//!     .with_subject(Subject::new("DS", "CSE-A", "Dr. Rao", 4).with_name("Data Structures"))
//!     .with_subject(
//!         Subject::new("DS-LAB", "CSE-A", "Dr. Iyer", 2).with_type(SubjectType::Lab),
//!     );
//!
//! let timetable = TimetableGenerator::default().generate(&snapshot).unwrap();
//! assert!(timetable.is_complete());
//! assert_eq!(timetable.assignment_count(), 6);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use config::{EngineConfig, SearchConfig};
pub use error::{EngineError, Result};
pub use generator::TimetableGenerator;
pub use scheduler::{CancellationToken, TimetableKpi};
