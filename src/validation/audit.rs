//! Post-hoc timetable audit (conflict detector).
//!
//! Re-verifies the hard constraints on a finished timetable using only
//! the timetable itself: its assignments, snapshot, grid, room pool, and
//! completeness report. Shares no state with the search.
//!
//! Checked invariants:
//! 1. At most one assignment per (batch, slot)
//! 2. At most one assignment per (faculty, slot), across all batches
//! 3. At most one assignment per (room, slot), when rooms are tracked
//! 4. Placed count ≤ weekly hours per subject, and the completeness
//!    report lists exactly the subjects below quota
//! 5. Assignments reference only snapshot entities and grid cells

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{Subject, TimeSlot, Timetable, Violation, ViolationType};

/// Audit result: `Ok(())` or every violation found, in a stable order.
pub type AuditResult = Result<(), Vec<Violation>>;

/// Audits a timetable against all hard constraints.
///
/// Pure and deterministic: auditing the same timetable twice yields the
/// same result.
pub fn audit_timetable(timetable: &Timetable) -> AuditResult {
    let snapshot = timetable.snapshot();
    let grid = timetable.grid();
    let rooms = timetable.rooms();
    let mut violations = Vec::new();

    let batch_ids: HashSet<&str> = snapshot.batches.iter().map(|b| b.id.as_str()).collect();
    let subjects: HashMap<&str, &Subject> = snapshot
        .subjects
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();

    let mut batch_load: BTreeMap<(&str, TimeSlot), usize> = BTreeMap::new();
    let mut faculty_load: BTreeMap<(&str, TimeSlot), usize> = BTreeMap::new();
    let mut room_load: BTreeMap<(&str, TimeSlot), usize> = BTreeMap::new();
    let mut placed: HashMap<&str, u32> = HashMap::new();

    for a in timetable.assignments() {
        if !batch_ids.contains(a.batch_id.as_str()) {
            violations.push(Violation::at_slot(
                ViolationType::DanglingReference,
                &a.batch_id,
                a.slot,
                format!("Assignment references unknown batch '{}'", a.batch_id),
            ));
        }
        match subjects.get(a.subject_id.as_str()) {
            None => violations.push(Violation::at_slot(
                ViolationType::DanglingReference,
                &a.subject_id,
                a.slot,
                format!("Assignment references unknown subject '{}'", a.subject_id),
            )),
            Some(s) => {
                if s.batch_id != a.batch_id {
                    violations.push(Violation::at_slot(
                        ViolationType::DanglingReference,
                        &a.subject_id,
                        a.slot,
                        format!(
                            "Subject '{}' belongs to batch '{}', assigned to '{}'",
                            s.id, s.batch_id, a.batch_id
                        ),
                    ));
                }
                if s.faculty_key() != a.faculty.trim() {
                    violations.push(Violation::at_slot(
                        ViolationType::DanglingReference,
                        &a.subject_id,
                        a.slot,
                        format!(
                            "Subject '{}' is taught by '{}', assignment names '{}'",
                            s.id,
                            s.faculty_key(),
                            a.faculty
                        ),
                    ));
                }
            }
        }

        if !grid.contains(a.slot) {
            violations.push(Violation::at_slot(
                ViolationType::SlotOutOfGrid,
                &a.batch_id,
                a.slot,
                format!(
                    "Slot (day {}, period {}) is outside the grid",
                    a.slot.day, a.slot.period
                ),
            ));
        }

        match &a.room_id {
            Some(room) if !rooms.contains(room) => violations.push(Violation::at_slot(
                ViolationType::InvalidRoom,
                room,
                a.slot,
                format!("Room '{room}' is not in the room pool"),
            )),
            None if rooms.is_enabled() => violations.push(Violation::at_slot(
                ViolationType::InvalidRoom,
                &a.batch_id,
                a.slot,
                format!(
                    "Assignment of '{}' for batch '{}' has no room",
                    a.subject_id, a.batch_id
                ),
            )),
            _ => {}
        }

        *batch_load.entry((a.batch_id.as_str(), a.slot)).or_insert(0) += 1;
        *faculty_load.entry((a.faculty.trim(), a.slot)).or_insert(0) += 1;
        if let Some(room) = &a.room_id {
            *room_load.entry((room.as_str(), a.slot)).or_insert(0) += 1;
        }
        *placed.entry(a.subject_id.as_str()).or_insert(0) += 1;
    }

    for (kind, label, load) in [
        (ViolationType::BatchDoubleBooked, "Batch", &batch_load),
        (ViolationType::FacultyDoubleBooked, "Faculty", &faculty_load),
        (ViolationType::RoomDoubleBooked, "Room", &room_load),
    ] {
        for (&(id, slot), &count) in load.iter().filter(|(_, count)| **count > 1) {
            violations.push(Violation::at_slot(
                kind,
                id,
                slot,
                format!(
                    "{label} '{id}' has {count} assignments at (day {}, period {})",
                    slot.day, slot.period
                ),
            ));
        }
    }

    let report = timetable.completeness();
    for s in &snapshot.subjects {
        let count = placed.get(s.id.as_str()).copied().unwrap_or(0);
        let required = s.hours_per_week;
        if count > required {
            violations.push(Violation::for_entity(
                ViolationType::QuotaExceeded,
                &s.id,
                format!("Subject '{}' placed {count} times, quota {required}", s.id),
            ));
        }
        match report.shortfall_for(&s.id) {
            None if count < required => violations.push(Violation::for_entity(
                ViolationType::ShortfallMismatch,
                &s.id,
                format!(
                    "Subject '{}' placed {count} of {required} hours but no shortfall is reported",
                    s.id
                ),
            )),
            Some(_) if count >= required => violations.push(Violation::for_entity(
                ViolationType::ShortfallMismatch,
                &s.id,
                format!("Subject '{}' meets its quota but is reported short", s.id),
            )),
            Some(sf)
                if sf.required_hours != required
                    || sf.placed_hours != count
                    || sf.shortfall_hours != required - count =>
            {
                violations.push(Violation::for_entity(
                    ViolationType::ShortfallMismatch,
                    &s.id,
                    format!(
                        "Subject '{}' reported {}/{} (short {}), actual {count}/{required}",
                        s.id, sf.placed_hours, sf.required_hours, sf.shortfall_hours
                    ),
                ))
            }
            _ => {}
        }
    }
    for sf in &report.shortfalls {
        if !subjects.contains_key(sf.subject_id.as_str()) {
            violations.push(Violation::for_entity(
                ViolationType::ShortfallMismatch,
                &sf.subject_id,
                format!("Shortfall reported for unknown subject '{}'", sf.subject_id),
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assignment, Batch, CompletenessReport, Department, EntitySnapshot, GridDefinition,
        RoomPool, Shortfall,
    };
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn snapshot() -> EntitySnapshot {
        EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_department(Department::new("D2"))
            .with_batch(Batch::new("B1", "D1"))
            .with_batch(Batch::new("B2", "D2"))
            .with_subject(Subject::new("S1", "B1", "Dr. Rao", 2))
            .with_subject(Subject::new("S2", "B2", "Dr. Rao", 1))
            .with_subject(Subject::new("S3", "B1", "Dr. Iyer", 1))
    }

    fn timetable(
        assignments: Vec<Assignment>,
        rooms: RoomPool,
        shortfalls: Vec<Shortfall>,
    ) -> Timetable {
        Timetable::from_parts(
            Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
            snapshot(),
            GridDefinition::uniform(1, 4),
            rooms,
            assignments,
            BTreeMap::new(),
            CompletenessReport { shortfalls },
        )
    }

    fn kinds(result: AuditResult) -> Vec<ViolationType> {
        result
            .unwrap_err()
            .into_iter()
            .map(|v| v.violation_type)
            .collect()
    }

    fn slot(p: usize) -> TimeSlot {
        TimeSlot::new(0, p)
    }

    fn valid_assignments() -> Vec<Assignment> {
        vec![
            Assignment::new("B1", "S1", "Dr. Rao", slot(0)),
            Assignment::new("B1", "S1", "Dr. Rao", slot(1)),
            Assignment::new("B2", "S2", "Dr. Rao", slot(2)),
            Assignment::new("B1", "S3", "Dr. Iyer", slot(2)),
        ]
    }

    #[test]
    fn test_valid_timetable() {
        let t = timetable(valid_assignments(), RoomPool::disabled(), vec![]);
        assert!(audit_timetable(&t).is_ok());
    }

    #[test]
    fn test_batch_double_booking() {
        let mut a = valid_assignments();
        a[3].slot = slot(0);
        let t = timetable(a, RoomPool::disabled(), vec![]);
        assert!(kinds(audit_timetable(&t)).contains(&ViolationType::BatchDoubleBooked));
    }

    #[test]
    fn test_faculty_double_booking_across_departments() {
        let mut a = valid_assignments();
        a[2].slot = slot(0); // B2 (dept D2) with Dr. Rao, same slot as B1
        let t = timetable(a, RoomPool::disabled(), vec![]);
        let errors = audit_timetable(&t).unwrap_err();
        let v = errors
            .iter()
            .find(|v| v.violation_type == ViolationType::FacultyDoubleBooked)
            .unwrap();
        assert_eq!(v.entity_id, "Dr. Rao");
        assert_eq!(v.slot, Some(slot(0)));
    }

    #[test]
    fn test_room_checks() {
        let rooms = RoomPool::default().with_room("R1").with_room("R2");
        let a = vec![
            Assignment::new("B1", "S1", "Dr. Rao", slot(0)).with_room("R1"),
            Assignment::new("B1", "S1", "Dr. Rao", slot(1)).with_room("R9"),
            Assignment::new("B2", "S2", "Dr. Rao", slot(2)).with_room("R1"),
            Assignment::new("B1", "S3", "Dr. Iyer", slot(2)).with_room("R1"),
        ];
        let k = kinds(audit_timetable(&timetable(a, rooms.clone(), vec![])));
        assert!(k.contains(&ViolationType::RoomDoubleBooked));
        assert!(k.contains(&ViolationType::InvalidRoom));

        // Tracking enabled but room missing
        let k = kinds(audit_timetable(&timetable(valid_assignments(), rooms, vec![])));
        assert_eq!(
            k.iter().filter(|&&v| v == ViolationType::InvalidRoom).count(),
            4
        );
    }

    #[test]
    fn test_quota_exceeded() {
        let mut a = valid_assignments();
        a.push(Assignment::new("B1", "S1", "Dr. Rao", slot(3)));
        let t = timetable(a, RoomPool::disabled(), vec![]);
        assert_eq!(kinds(audit_timetable(&t)), vec![ViolationType::QuotaExceeded]);
    }

    #[test]
    fn test_unreported_shortfall() {
        let mut a = valid_assignments();
        a.remove(1);
        let t = timetable(a.clone(), RoomPool::disabled(), vec![]);
        assert_eq!(
            kinds(audit_timetable(&t)),
            vec![ViolationType::ShortfallMismatch]
        );

        let t = timetable(
            a,
            RoomPool::disabled(),
            vec![Shortfall::new("S1", "B1", 2, 1)],
        );
        assert!(audit_timetable(&t).is_ok());
    }

    #[test]
    fn test_wrong_shortfall_amount_and_spurious_entries() {
        let t = timetable(
            valid_assignments(),
            RoomPool::disabled(),
            vec![Shortfall::new("S1", "B1", 2, 1), Shortfall::new("S9", "B1", 1, 0)],
        );
        let k = kinds(audit_timetable(&t));
        assert_eq!(
            k,
            vec![ViolationType::ShortfallMismatch, ViolationType::ShortfallMismatch]
        );
    }

    #[test]
    fn test_dangling_references() {
        let a = vec![
            Assignment::new("B1", "S1", "Dr. Rao", slot(0)),
            Assignment::new("B1", "S1", "Dr. Rao", slot(1)),
            Assignment::new("B2", "S2", "Dr. Rao", slot(2)),
            Assignment::new("B1", "S3", "Dr. Iyer", slot(2)),
            Assignment::new("B7", "S1", "Dr. Rao", slot(3)),
            Assignment::new("B1", "S8", "Dr. Rao", slot(3)),
            Assignment::new("B1", "S3", "Dr. Nobody", slot(3)),
        ];
        let errors = audit_timetable(&timetable(a, RoomPool::disabled(), vec![])).unwrap_err();
        let dangling = errors
            .iter()
            .filter(|v| v.violation_type == ViolationType::DanglingReference)
            .count();
        // unknown batch, subject in wrong batch, unknown subject, wrong faculty
        assert_eq!(dangling, 4);
    }

    #[test]
    fn test_slot_out_of_grid() {
        let mut a = valid_assignments();
        a[3].slot = TimeSlot::new(1, 0);
        let t = timetable(a, RoomPool::disabled(), vec![]);
        assert_eq!(kinds(audit_timetable(&t)), vec![ViolationType::SlotOutOfGrid]);
    }

    #[test]
    fn test_audit_is_idempotent() {
        let mut a = valid_assignments();
        a[2].slot = slot(0);
        a.push(Assignment::new("B1", "S1", "Dr. Rao", slot(3)));
        let t = timetable(a, RoomPool::disabled(), vec![]);
        assert_eq!(audit_timetable(&t), audit_timetable(&t));
    }
}
