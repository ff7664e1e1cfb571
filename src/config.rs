//! Engine configuration.
//!
//! Every field has a default, so a configuration can be built in code
//! with the `with_*` methods or loaded from a partial JSON document:
//!
//! ```
//! use u_timetable::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "search": { "backtrack_budget": 32 } }"#).unwrap();
//! assert_eq!(config.search.backtrack_budget, 32);
//! assert_eq!(config.grid.slot_count(), 30);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{GridDefinition, RoomPool, SubjectType};
use crate::validation;

/// Default per-batch backtrack budget.
pub const DEFAULT_BACKTRACK_BUDGET: usize = 256;

/// Search tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum retractions per batch before unmet quotas are accepted.
    pub backtrack_budget: usize,
    /// Subject types placed as contiguous same-day period pairs.
    pub double_period_types: Vec<SubjectType>,
    /// Deadline for the async worker (ms). `None` = no deadline.
    pub time_limit_ms: Option<u64>,
}

impl SearchConfig {
    /// Sets the per-batch backtrack budget.
    pub fn with_backtrack_budget(mut self, budget: usize) -> Self {
        self.backtrack_budget = budget;
        self
    }

    /// Sets which subject types need double periods.
    pub fn with_double_period_types(mut self, types: Vec<SubjectType>) -> Self {
        self.double_period_types = types;
        self
    }

    /// Sets the async worker deadline.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Whether subjects of this type are placed in double periods.
    pub fn needs_double_period(&self, subject_type: SubjectType) -> bool {
        self.double_period_types.contains(&subject_type)
    }

    /// Worker deadline as a duration.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backtrack_budget: DEFAULT_BACKTRACK_BUDGET,
            double_period_types: vec![SubjectType::Lab, SubjectType::Practical],
            time_limit_ms: None,
        }
    }
}

/// Full engine configuration: grid, rooms, and search tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weekly grid.
    pub grid: GridDefinition,
    /// Room pool (empty = rooms not tracked).
    pub rooms: RoomPool,
    /// Search tuning.
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the grid.
    pub fn with_grid(mut self, grid: GridDefinition) -> Self {
        self.grid = grid;
        self
    }

    /// Sets the room pool.
    pub fn with_rooms(mut self, rooms: RoomPool) -> Self {
        self.rooms = rooms;
        self
    }

    /// Sets the search tuning.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Checks the grid and room pool.
    pub fn validate(&self) -> Result<()> {
        let mut errors = validation::validate_grid(&self.grid);
        errors.extend(validation::validate_rooms(&self.rooms));
        if let Some(0) = self.search.time_limit_ms {
            return Err(EngineError::Config("time_limit_ms must be positive".into()));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Input(errors))
        }
    }
}
