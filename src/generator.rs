//! Generation runs.
//!
//! [`TimetableGenerator`] owns the immutable run configuration (grid,
//! room pool, search settings) and executes runs against entity
//! snapshots. A run is:
//!
//! 1. validate the input (fails fast with [`EngineError::Input`])
//! 2. build the constraint model and run the assignment search
//! 3. build the timetable and its completeness report
//! 4. audit the timetable (fails with [`EngineError::ValidatorViolation`])
//!
//! Runs share nothing mutable. The grid and room pool sit behind `Arc`s,
//! so cloning a generator for a worker task is cheap and parallel runs
//! read the same grid.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use crate::config::{EngineConfig, SearchConfig};
use crate::error::{EngineError, Result};
use crate::models::{EntitySnapshot, GridDefinition, RoomPool, Timetable};
use crate::scheduler::{AssignmentSearch, CancellationToken, ConstraintModel, ScheduleBuilder};
use crate::validation::{audit_timetable, validate_input};

/// Timetable generation engine.
///
/// # Example
///
/// ```
/// use u_timetable::{TimetableGenerator, EngineConfig};
/// use u_timetable::models::{Batch, Department, EntitySnapshot, GridDefinition, Subject};
///
/// let config = EngineConfig::default().with_grid(GridDefinition::uniform(5, 6));
/// let generator = TimetableGenerator::new(config).unwrap();
///
/// let snapshot = EntitySnapshot::default()
///     .with_department(Department::new("CSE"))
///     .with_batch(Batch::new("CSE-A", "CSE"))
///     .with_subject(Subject::new("DS", "CSE-A", "Dr. Rao", 2));
///
/// let timetable = generator.generate(&snapshot).unwrap();
/// assert_eq!(timetable.assignment_count(), 2);
/// assert!(timetable.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct TimetableGenerator {
    grid: Arc<GridDefinition>,
    rooms: Arc<RoomPool>,
    search: SearchConfig,
}

impl TimetableGenerator {
    /// Creates a generator from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let EngineConfig {
            grid,
            rooms,
            search,
        } = config;
        Ok(Self {
            grid: Arc::new(grid),
            rooms: Arc::new(rooms),
            search,
        })
    }

    /// Grid shared by every run.
    pub fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    /// Room pool (empty if rooms are not tracked).
    pub fn rooms(&self) -> &RoomPool {
        &self.rooms
    }

    /// Search settings.
    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Generates a timetable stamped with the current time.
    pub fn generate(&self, snapshot: &EntitySnapshot) -> Result<Timetable> {
        self.generate_at(snapshot, Utc::now())
    }

    /// Generates a timetable with an explicit timestamp.
    ///
    /// Identical snapshots and timestamps yield identical timetables.
    pub fn generate_at(
        &self,
        snapshot: &EntitySnapshot,
        generated_at: DateTime<Utc>,
    ) -> Result<Timetable> {
        self.generate_with_cancellation(snapshot, generated_at, &CancellationToken::new())
    }

    /// Generates a timetable, stopping with [`EngineError::Cancelled`]
    /// once `token` is raised.
    #[instrument(skip_all, fields(batches = snapshot.batches.len()))]
    pub fn generate_with_cancellation(
        &self,
        snapshot: &EntitySnapshot,
        generated_at: DateTime<Utc>,
        token: &CancellationToken,
    ) -> Result<Timetable> {
        let started = Instant::now();

        validate_input(snapshot, &self.grid, &self.rooms).map_err(EngineError::Input)?;
        info!(
            departments = snapshot.departments.len(),
            batches = snapshot.batches.len(),
            subjects = snapshot.subjects.len(),
            slots = self.grid.slot_count(),
            rooms = self.rooms.len(),
            "timetable generation started"
        );

        let model = ConstraintModel::build(snapshot, &self.grid, &self.rooms, &self.search)?;
        let outcome = AssignmentSearch::new(&model, &self.search)
            .with_cancellation(token.clone())
            .run()?;

        let timetable =
            ScheduleBuilder::new(snapshot, &self.grid, &self.rooms).build(&outcome.state, generated_at);

        if let Err(violations) = audit_timetable(&timetable) {
            for v in &violations {
                error!(
                    kind = ?v.violation_type,
                    entity = %v.entity_id,
                    slot = ?v.slot,
                    "{}",
                    v.message
                );
            }
            return Err(EngineError::ValidatorViolation(violations));
        }

        info!(
            assignments = timetable.assignment_count(),
            shortfalls = timetable.completeness().shortfalls.len(),
            placements = outcome.stats.placements,
            backtracks = outcome.stats.backtracks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "timetable generation finished"
        );
        Ok(timetable)
    }

    /// Runs generation on the blocking pool, bounded by `limit`.
    ///
    /// On timeout the worker's token is raised so it drops its state at
    /// the next search step, and [`EngineError::Timeout`] is returned.
    pub async fn generate_with_timeout(
        &self,
        snapshot: EntitySnapshot,
        limit: Duration,
    ) -> Result<Timetable> {
        let token = CancellationToken::new();
        let handle = self.spawn_worker(snapshot, token.clone());

        match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined.map_err(|e| EngineError::Worker(e.to_string()))?,
            Err(_) => {
                token.cancel();
                warn!(limit_ms = limit.as_millis() as u64, "timetable generation timed out");
                Err(EngineError::Timeout(limit))
            }
        }
    }

    /// Runs generation on the blocking pool, bounded by the configured
    /// time limit if there is one.
    pub async fn generate_async(&self, snapshot: EntitySnapshot) -> Result<Timetable> {
        match self.search.time_limit() {
            Some(limit) => self.generate_with_timeout(snapshot, limit).await,
            None => self
                .spawn_worker(snapshot, CancellationToken::new())
                .await
                .map_err(|e| EngineError::Worker(e.to_string()))?,
        }
    }

    fn spawn_worker(
        &self,
        snapshot: EntitySnapshot,
        token: CancellationToken,
    ) -> tokio::task::JoinHandle<Result<Timetable>> {
        let generator = self.clone();
        let generated_at = Utc::now();
        tokio::task::spawn_blocking(move || {
            generator.generate_with_cancellation(&snapshot, generated_at, &token)
        })
    }
}

impl Default for TimetableGenerator {
    /// Standard five-day grid, no room tracking, default search settings.
    fn default() -> Self {
        Self {
            grid: Arc::new(GridDefinition::standard()),
            rooms: Arc::new(RoomPool::disabled()),
            search: SearchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, Department, Period, Subject, SubjectType, TimeSlot};
    use crate::validation::ValidationErrorKind;
    use chrono::TimeZone;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{HashMap, HashSet};
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_test() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn generator(grid: GridDefinition) -> TimetableGenerator {
        TimetableGenerator::new(EngineConfig::default().with_grid(grid)).unwrap()
    }

    fn single_batch(hours: u32) -> EntitySnapshot {
        EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_subject(Subject::new("S1", "B1", "Dr. Rao", hours))
    }

    fn shared_faculty() -> EntitySnapshot {
        EntitySnapshot::default()
            .with_department(Department::new("CSE"))
            .with_department(Department::new("ECE"))
            .with_batch(Batch::new("CSE-A", "CSE"))
            .with_batch(Batch::new("ECE-A", "ECE"))
            .with_subject(Subject::new("DS", "CSE-A", "Dr. Rao", 6))
            .with_subject(Subject::new("SIG", "ECE-A", "Dr. Rao", 6))
    }

    /// Every hard invariant, checked from the assignment list alone.
    fn assert_invariants(tt: &Timetable) {
        let mut batch_slots = HashSet::new();
        let mut faculty_slots = HashSet::new();
        let mut room_slots = HashSet::new();
        for a in tt.assignments() {
            assert!(batch_slots.insert((a.batch_id.clone(), a.slot)), "batch double-booked");
            assert!(faculty_slots.insert((a.faculty.clone(), a.slot)), "faculty double-booked");
            if let Some(room) = &a.room_id {
                assert!(room_slots.insert((room.clone(), a.slot)), "room double-booked");
            }
            assert!(tt.grid().contains(a.slot));
        }
        for s in &tt.snapshot().subjects {
            let placed = tt.placed_hours(&s.id);
            assert!(placed <= s.hours_per_week);
            match tt.completeness().shortfall_for(&s.id) {
                None => assert_eq!(placed, s.hours_per_week),
                Some(short) => {
                    assert_eq!(short.placed_hours, placed);
                    assert_eq!(short.shortfall_hours, s.hours_per_week - placed);
                }
            }
        }
    }

    #[test]
    fn test_scenario_single_subject() {
        init_test();
        let tt = generator(GridDefinition::uniform(5, 6))
            .generate_at(&single_batch(2), at())
            .unwrap();

        assert_eq!(tt.assignment_count(), 2);
        assert_eq!(tt.placed_hours("S1"), 2);
        assert!(tt.is_complete());
        assert_eq!(tt.generated_at(), at());
    }

    #[test]
    fn test_scenario_shared_faculty_never_overlaps() {
        let tt = TimetableGenerator::default()
            .generate_at(&shared_faculty(), at())
            .unwrap();

        assert_eq!(tt.grid().slot_count(), 30);
        assert!(tt.is_complete());
        let mut load: HashMap<TimeSlot, usize> = HashMap::new();
        for a in tt.assignments_for_faculty("Dr. Rao") {
            *load.entry(a.slot).or_insert(0) += 1;
        }
        assert_eq!(load.values().sum::<usize>(), 12);
        assert!(load.values().all(|&n| n == 1));
    }

    #[test]
    fn test_scenario_quota_exceeds_grid() {
        let tt = generator(GridDefinition::uniform(1, 6))
            .generate_at(&single_batch(10), at())
            .unwrap();

        assert!(!tt.is_complete());
        let short = tt.completeness().shortfall_for("S1").unwrap();
        assert_eq!(short.placed_hours, 6);
        assert_eq!(short.shortfall_hours, 4);
        assert_eq!(tt.batch("B1").unwrap().filled_count(), 6);
    }

    #[test]
    fn test_scenario_dangling_batch_rejected() {
        let snapshot = single_batch(2).with_subject(Subject::new("S2", "B9", "Dr. Iyer", 2));
        let err = TimetableGenerator::default().generate(&snapshot).unwrap_err();

        assert!(matches!(err, EngineError::Input(_)));
        assert!(!err.is_defect());
        let errors = err.validation_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownBatch);
        assert!(errors[0].message.contains("B9"));
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let snapshot = EntitySnapshot::default().with_department(Department::new("D1"));
        let err = TimetableGenerator::default().generate(&snapshot).unwrap_err();
        assert!(err
            .validation_errors()
            .iter()
            .all(|e| e.kind == ValidationErrorKind::EmptySnapshot));
        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default()
            .with_search(SearchConfig::default().with_time_limit(Duration::ZERO));
        assert!(matches!(
            TimetableGenerator::new(config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_determinism_byte_identical() {
        let snapshot = shared_faculty()
            .with_batch(Batch::new("CSE-B", "CSE"))
            .with_subject(Subject::new("OS", "CSE-B", "Dr. Iyer", 4))
            .with_subject(Subject::new("LAB", "CSE-B", "Dr. Rao", 4).with_type(SubjectType::Lab));
        let config = EngineConfig::default().with_rooms(RoomPool::numbered("Room", 101, 2));
        let g = TimetableGenerator::new(config).unwrap();

        let a = serde_json::to_string(&g.generate_at(&snapshot, at()).unwrap()).unwrap();
        let b = serde_json::to_string(&g.generate_at(&snapshot, at()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_audit_idempotent_on_output() {
        let tt = TimetableGenerator::default()
            .generate_at(&shared_faculty(), at())
            .unwrap();
        assert_eq!(audit_timetable(&tt), audit_timetable(&tt));
        assert!(audit_timetable(&tt).is_ok());
    }

    #[test]
    fn test_lab_placed_in_contiguous_pairs() {
        let snapshot = single_batch(1)
            .with_subject(Subject::new("L1", "B1", "Dr. Iyer", 3).with_type(SubjectType::Lab));
        let tt = TimetableGenerator::default().generate_at(&snapshot, at()).unwrap();

        assert!(tt.is_complete());
        let lab: Vec<TimeSlot> = tt
            .assignments()
            .iter()
            .filter(|a| a.subject_id == "L1")
            .map(|a| a.slot)
            .collect();
        // first block is a pair that does not straddle a break
        assert_eq!(lab[0].day, lab[1].day);
        assert_eq!(lab[0].period + 1, lab[1].period);
        assert!(tt.grid().is_double_start(lab[0].period));
        assert_eq!(lab.len(), 3);
    }

    #[test]
    fn test_lab_without_pairs_is_shortfall() {
        let grid = GridDefinition::new(
            vec!["Monday".into()],
            vec![
                Period::teaching("P1"),
                Period::break_period("Break 1"),
                Period::teaching("P2"),
                Period::break_period("Break 2"),
                Period::teaching("P3"),
            ],
        );
        let snapshot = EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_subject(Subject::new("L1", "B1", "Dr. Iyer", 2).with_type(SubjectType::Practical));
        let tt = generator(grid).generate_at(&snapshot, at()).unwrap();

        assert_eq!(tt.assignment_count(), 0);
        assert_eq!(tt.completeness().shortfall_for("L1").unwrap().shortfall_hours, 2);
    }

    #[test]
    fn test_lab_as_singles_when_not_configured() {
        let grid = GridDefinition::new(
            vec!["Monday".into()],
            vec![
                Period::teaching("P1"),
                Period::break_period("Break"),
                Period::teaching("P2"),
            ],
        );
        let config = EngineConfig::default()
            .with_grid(grid)
            .with_search(SearchConfig::default().with_double_period_types(vec![]));
        let snapshot = EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_subject(Subject::new("L1", "B1", "Dr. Iyer", 2).with_type(SubjectType::Lab));
        let tt = TimetableGenerator::new(config)
            .unwrap()
            .generate_at(&snapshot, at())
            .unwrap();
        assert!(tt.is_complete());
    }

    #[test]
    fn test_room_exhaustion_limits_parallel_classes() {
        // three batches, one room: at most one class per slot
        let snapshot = EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_batch(Batch::new("B2", "D1"))
            .with_batch(Batch::new("B3", "D1"))
            .with_subject(Subject::new("S1", "B1", "F1", 2))
            .with_subject(Subject::new("S2", "B2", "F2", 2))
            .with_subject(Subject::new("S3", "B3", "F3", 2));
        let config = EngineConfig::default()
            .with_grid(GridDefinition::uniform(1, 4))
            .with_rooms(RoomPool::default().with_room("R1"));
        let tt = TimetableGenerator::new(config)
            .unwrap()
            .generate_at(&snapshot, at())
            .unwrap();

        assert_invariants(&tt);
        assert_eq!(tt.assignment_count(), 4);
        assert_eq!(tt.completeness().total_shortfall_hours(), 2);
        assert!(tt.assignments().iter().all(|a| a.room_id.as_deref() == Some("R1")));
    }

    #[test]
    fn test_larger_budget_never_places_fewer_hours() {
        // B0 takes Dr. Rao at two of four slots; B1 needs Dr. Rao three times
        let snapshot = EntitySnapshot::default()
            .with_department(Department::new("D1"))
            .with_batch(Batch::new("B0", "D1"))
            .with_batch(Batch::new("B1", "D1"))
            .with_subject(Subject::new("Z", "B0", "Dr. Rao", 2))
            .with_subject(Subject::new("W", "B0", "Dr. Iyer", 2))
            .with_subject(Subject::new("T", "B1", "Dr. Rao", 3));
        let run = |budget: usize| {
            let config = EngineConfig::default()
                .with_grid(GridDefinition::uniform(1, 4))
                .with_search(SearchConfig::default().with_backtrack_budget(budget));
            TimetableGenerator::new(config)
                .unwrap()
                .generate_at(&snapshot, at())
                .unwrap()
        };
        let greedy = run(0);
        let searched = run(256);

        assert_invariants(&greedy);
        assert_invariants(&searched);
        assert_eq!(greedy.placed_hours("T"), 2);
        assert!(searched.placed_hours("T") >= greedy.placed_hours("T"));
        assert_eq!(
            searched.completeness().total_shortfall_hours(),
            greedy.completeness().total_shortfall_hours()
        );
        assert_eq!(searched.completeness().shortfall_for("T").unwrap().shortfall_hours, 1);
    }

    #[test]
    fn test_random_instances_hold_invariants() {
        let mut rng = SmallRng::seed_from_u64(42);
        let faculty = ["Dr. Rao", "Dr. Iyer", "Dr. Sen", " Dr. Rao", "Dr. Das"];
        let types = [SubjectType::Theory, SubjectType::Lab, SubjectType::Practical];

        for _ in 0..40 {
            let mut snapshot = EntitySnapshot::default()
                .with_department(Department::new("D1"))
                .with_department(Department::new("D2"));
            let batches = rng.random_range(1..=5);
            for b in 0..batches {
                let batch_id = format!("B{b}");
                snapshot = snapshot.with_batch(Batch::new(&batch_id, if b % 2 == 0 { "D1" } else { "D2" }));
                for s in 0..rng.random_range(1..=5) {
                    let subject = Subject::new(
                        format!("{batch_id}-S{s}"),
                        &batch_id,
                        faculty[rng.random_range(0..faculty.len())],
                        rng.random_range(1..=6),
                    )
                    .with_type(types[rng.random_range(0..types.len())]);
                    snapshot = snapshot.with_subject(subject);
                }
            }
            let rooms = RoomPool::numbered("Room", 1, rng.random_range(0..=3));
            let config = EngineConfig::default()
                .with_grid(GridDefinition::uniform(
                    rng.random_range(1..=5),
                    rng.random_range(2..=6),
                ))
                .with_rooms(rooms)
                .with_search(SearchConfig::default().with_backtrack_budget(rng.random_range(0..=64)));

            let tt = TimetableGenerator::new(config)
                .unwrap()
                .generate_at(&snapshot, at())
                .unwrap();
            assert_invariants(&tt);
        }
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let token = CancellationToken::new();
        token.cancel();
        let err = TimetableGenerator::default()
            .generate_with_cancellation(&shared_faculty(), at(), &token)
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn test_generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TimetableGenerator>();
        assert_send_sync::<Timetable>();
    }

    #[test]
    fn test_parallel_runs_share_grid() {
        let g = TimetableGenerator::default();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let g = g.clone();
                std::thread::spawn(move || g.generate_at(&shared_faculty(), at()))
            })
            .collect();
        let results: Vec<Timetable> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_generate_with_timeout_completes() {
        let tt = TimetableGenerator::default()
            .generate_with_timeout(shared_faculty(), Duration::from_secs(30))
            .await
            .unwrap();
        assert!(tt.is_complete());
        assert_eq!(tt.assignment_count(), 12);
    }

    #[tokio::test]
    async fn test_generate_async_uses_config_limit() {
        let config = EngineConfig::default()
            .with_search(SearchConfig::default().with_time_limit(Duration::from_secs(30)));
        let g = TimetableGenerator::new(config).unwrap();
        let tt = g.generate_async(single_batch(3)).await.unwrap();
        assert_eq!(tt.placed_hours("S1"), 3);

        let tt = TimetableGenerator::default()
            .generate_async(single_batch(3))
            .await
            .unwrap();
        assert_eq!(tt.placed_hours("S1"), 3);
    }

    #[tokio::test]
    async fn test_generate_with_timeout_expires() {
        // many batches contending for a handful of faculty
        let mut snapshot = EntitySnapshot::default().with_department(Department::new("D1"));
        for b in 0..200 {
            let batch_id = format!("B{b}");
            snapshot = snapshot.with_batch(Batch::new(&batch_id, "D1"));
            for s in 0..6 {
                snapshot = snapshot.with_subject(Subject::new(
                    format!("{batch_id}-S{s}"),
                    &batch_id,
                    format!("F{}", (b + s) % 8),
                    5,
                ));
            }
        }
        let err = TimetableGenerator::default()
            .generate_with_timeout(snapshot, Duration::from_nanos(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }
}
