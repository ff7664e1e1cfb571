//! Timetable quality metrics (KPIs).
//!
//! Computes coverage and load indicators from a finished timetable.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Fill Rate | placed hours / required hours |
//! | Quota Met Rate | fraction of subjects with no shortfall |
//! | Batch Utilization | filled slots / grid slots, per batch |
//! | Faculty Load | weekly teaching hours per faculty member |
//! | Room Utilization | occupied slots / grid slots, per room |

use std::collections::HashMap;

use crate::models::Timetable;

/// Timetable performance indicators.
#[derive(Debug, Clone)]
pub struct TimetableKpi {
    /// Sum of weekly hours over all subjects.
    pub required_hours: u64,
    /// Number of assignments.
    pub placed_hours: u64,
    /// `placed_hours / required_hours` (0.0..1.0).
    pub fill_rate: f64,
    /// Fraction of subjects meeting their quota (0.0..1.0).
    pub quota_met_rate: f64,
    /// Average batch utilization (0.0..1.0).
    pub avg_batch_utilization: f64,
    /// Per-batch utilization.
    pub utilization_by_batch: HashMap<String, f64>,
    /// Weekly hours per faculty member.
    pub faculty_load: HashMap<String, usize>,
    /// Per-room utilization (empty when rooms are not tracked).
    pub utilization_by_room: HashMap<String, f64>,
}

impl TimetableKpi {
    /// Computes KPIs from a timetable.
    pub fn calculate(timetable: &Timetable) -> Self {
        let snapshot = timetable.snapshot();
        let slot_count = timetable.grid().slot_count();
        let assignments = timetable.assignments();

        let required_hours = snapshot.total_required_hours();
        let placed_hours = assignments.len() as u64;
        let fill_rate = if required_hours == 0 {
            1.0
        } else {
            placed_hours as f64 / required_hours as f64
        };

        let quota_met_rate = if snapshot.subjects.is_empty() {
            1.0
        } else {
            let short = timetable.completeness().shortfalls.len();
            (snapshot.subjects.len() - short.min(snapshot.subjects.len())) as f64
                / snapshot.subjects.len() as f64
        };

        let ratio = |count: usize| {
            if slot_count == 0 {
                0.0
            } else {
                count as f64 / slot_count as f64
            }
        };

        let mut batch_counts: HashMap<&str, usize> = snapshot
            .batches
            .iter()
            .map(|b| (b.id.as_str(), 0))
            .collect();
        let mut faculty_load: HashMap<String, usize> = HashMap::new();
        let mut room_counts: HashMap<&str, usize> =
            timetable.rooms().iter().map(|r| (r, 0)).collect();

        for a in assignments {
            *batch_counts.entry(a.batch_id.as_str()).or_insert(0) += 1;
            *faculty_load.entry(a.faculty.clone()).or_insert(0) += 1;
            if let Some(room) = &a.room_id {
                *room_counts.entry(room.as_str()).or_insert(0) += 1;
            }
        }

        let utilization_by_batch: HashMap<String, f64> = batch_counts
            .into_iter()
            .map(|(id, n)| (id.to_string(), ratio(n)))
            .collect();
        let avg_batch_utilization = if utilization_by_batch.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_batch.values().sum();
            sum / utilization_by_batch.len() as f64
        };
        let utilization_by_room = room_counts
            .into_iter()
            .map(|(id, n)| (id.to_string(), ratio(n)))
            .collect();

        Self {
            required_hours,
            placed_hours,
            fill_rate,
            quota_met_rate,
            avg_batch_utilization,
            utilization_by_batch,
            faculty_load,
            utilization_by_room,
        }
    }

    /// Whether the timetable meets the given coverage thresholds.
    pub fn meets_thresholds(&self, min_fill_rate: f64, min_quota_met_rate: f64) -> bool {
        self.fill_rate >= min_fill_rate && self.quota_met_rate >= min_quota_met_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, Department, EntitySnapshot, GridDefinition, RoomPool, Subject};
    use crate::{EngineConfig, SearchConfig, TimetableGenerator};
    use chrono::{TimeZone, Utc};

    fn generate(snapshot: &EntitySnapshot, grid: GridDefinition, rooms: RoomPool) -> Timetable {
        let config = EngineConfig::default()
            .with_grid(grid)
            .with_rooms(rooms)
            .with_search(SearchConfig::default());
        TimetableGenerator::new(config)
            .unwrap()
            .generate_at(snapshot, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .unwrap()
    }

    fn snapshot() -> EntitySnapshot {
        EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_batch(Batch::new("B2", "D1"))
            .with_subject(Subject::new("S1", "B1", "Dr. Rao", 2))
            .with_subject(Subject::new("S2", "B2", "Dr. Rao", 1))
            .with_subject(Subject::new("S3", "B2", "Dr. Iyer", 1))
    }

    #[test]
    fn test_kpi_complete_timetable() {
        let tt = generate(&snapshot(), GridDefinition::uniform(1, 4), RoomPool::disabled());
        let kpi = TimetableKpi::calculate(&tt);

        assert_eq!(kpi.required_hours, 4);
        assert_eq!(kpi.placed_hours, 4);
        assert!((kpi.fill_rate - 1.0).abs() < 1e-10);
        assert!((kpi.quota_met_rate - 1.0).abs() < 1e-10);
        // B1: 2/4, B2: 2/4
        assert!((kpi.utilization_by_batch["B1"] - 0.5).abs() < 1e-10);
        assert!((kpi.avg_batch_utilization - 0.5).abs() < 1e-10);
        assert_eq!(kpi.faculty_load["Dr. Rao"], 3);
        assert_eq!(kpi.faculty_load["Dr. Iyer"], 1);
        assert!(kpi.utilization_by_room.is_empty());
    }

    #[test]
    fn test_kpi_shortfall() {
        // Dr. Rao needs 3 slots but the week has 2
        let tt = generate(&snapshot(), GridDefinition::uniform(1, 2), RoomPool::disabled());
        let kpi = TimetableKpi::calculate(&tt);

        assert_eq!(kpi.placed_hours, 3);
        assert!((kpi.fill_rate - 0.75).abs() < 1e-10);
        assert!((kpi.quota_met_rate - 2.0 / 3.0).abs() < 1e-10);
        assert!(kpi.meets_thresholds(0.75, 0.5));
        assert!(!kpi.meets_thresholds(0.8, 0.5));
        assert!(!kpi.meets_thresholds(0.5, 0.9));
    }

    #[test]
    fn test_kpi_room_utilization() {
        let rooms = RoomPool::default().with_room("R1").with_room("R2");
        let tt = generate(&snapshot(), GridDefinition::uniform(1, 4), rooms);
        let kpi = TimetableKpi::calculate(&tt);

        assert_eq!(kpi.utilization_by_room.len(), 2);
        let used: f64 = kpi.utilization_by_room.values().sum();
        // 4 room-slots over a 4-slot week
        assert!((used - 1.0).abs() < 1e-10);
        assert!(kpi.utilization_by_room["R1"] >= kpi.utilization_by_room["R2"]);
    }
}
