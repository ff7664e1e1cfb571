//! Timetabling domain models.
//!
//! Provides the data types for describing a timetabling problem (grid,
//! entities, rooms) and its solution (timetable).
//!
//! # Domain Mappings
//!
//! | u-timetable | College | School | Training Center |
//! |-------------|---------|--------|-----------------|
//! | Batch | Class Section | Grade Group | Cohort |
//! | Subject | Course Offering | Lesson | Module |
//! | Faculty | Lecturer | Teacher | Trainer |
//! | Room | Lecture Hall / Lab | Classroom | Studio |

mod entity;
mod grid;
mod room;
mod snapshot;
mod timetable;

pub use entity::{Batch, Department, Subject, SubjectType};
pub use grid::{GridDefinition, Period, TimeSlot};
pub use room::RoomPool;
pub use snapshot::EntitySnapshot;
pub use timetable::{
    Assignment, BatchTimetable, CompletenessReport, DaySchedule, ScheduleCell, Shortfall,
    SlotEntry, Timetable, Violation, ViolationType,
};
