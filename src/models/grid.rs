//! Weekly grid model.
//!
//! The grid is the addressable schedule space: an ordered list of days
//! crossed with an ordered list of teaching periods. Break periods are
//! part of the period sequence (so they can be displayed) but are not
//! addressable and split period contiguity.
//!
//! # Indexing
//! Every teaching cell has a stable linear index
//! `day * periods_per_day + period`, used as the array key by the
//! constraint model and search state.

use serde::{Deserialize, Serialize};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A period within a day (teaching period or break).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Display label (e.g., "9:00-10:00").
    pub label: String,
    /// Breaks are shown but never scheduled.
    #[serde(default)]
    pub is_break: bool,
}

impl Period {
    /// Creates a teaching period.
    pub fn teaching(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_break: false,
        }
    }

    /// Creates a break period.
    pub fn break_period(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_break: true,
        }
    }
}

/// One addressable (day, period) cell.
///
/// `period` counts teaching periods only (breaks are skipped).
/// Ordered by day, then period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day position in [`GridDefinition::days`].
    pub day: usize,
    /// Teaching period position within the day.
    pub period: usize,
}

impl TimeSlot {
    /// Creates a slot.
    pub fn new(day: usize, period: usize) -> Self {
        Self { day, period }
    }
}

/// Fixed weekly grid of days × teaching periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDefinition {
    /// Ordered day names.
    pub days: Vec<String>,
    /// Ordered periods of a day, breaks included.
    pub periods: Vec<Period>,
    /// Teaching periods allowed to start a double-length block.
    ///
    /// `None` = every period whose successor is adjacent (no break between).
    #[serde(default)]
    pub double_starts: Option<Vec<usize>>,
}

impl GridDefinition {
    /// Creates a grid from day names and periods.
    pub fn new(days: Vec<String>, periods: Vec<Period>) -> Self {
        Self {
            days,
            periods,
            double_starts: None,
        }
    }

    /// The standard Monday–Friday week.
    ///
    /// Six teaching periods per day with a morning break after the
    /// second period and lunch after the fourth, giving 30 slots.
    /// Contiguous pairs: (1st, 2nd), (3rd, 4th), (5th, 6th).
    pub fn standard() -> Self {
        let days = WEEKDAYS[..5].iter().map(|d| d.to_string()).collect();
        let periods = vec![
            Period::teaching("9:00-10:00"),
            Period::teaching("10:00-11:00"),
            Period::break_period("11:00-11:30"),
            Period::teaching("11:30-12:30"),
            Period::teaching("12:30-1:30"),
            Period::break_period("1:30-2:30"),
            Period::teaching("2:30-3:30"),
            Period::teaching("3:30-4:30"),
        ];
        Self::new(days, periods)
    }

    /// A grid of `days` days with `periods_per_day` back-to-back periods
    /// and no breaks.
    ///
    /// Days take weekday names while they last, then "Day N".
    pub fn uniform(days: usize, periods_per_day: usize) -> Self {
        let days = (0..days)
            .map(|d| match WEEKDAYS.get(d) {
                Some(name) => name.to_string(),
                None => format!("Day {}", d + 1),
            })
            .collect();
        let periods = (0..periods_per_day)
            .map(|p| Period::teaching(format!("P{}", p + 1)))
            .collect();
        Self::new(days, periods)
    }

    /// Restricts double-length blocks to the given starting periods.
    pub fn with_double_starts(mut self, starts: Vec<usize>) -> Self {
        self.double_starts = Some(starts);
        self
    }

    /// Number of days.
    #[inline]
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Number of teaching periods per day.
    pub fn periods_per_day(&self) -> usize {
        self.periods.iter().filter(|p| !p.is_break).count()
    }

    /// Total number of addressable slots.
    pub fn slot_count(&self) -> usize {
        self.day_count() * self.periods_per_day()
    }

    /// Positions in [`Self::periods`] of the teaching periods, in order.
    fn teaching_positions(&self) -> Vec<usize> {
        self.periods
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_break)
            .map(|(i, _)| i)
            .collect()
    }

    /// Labels of the teaching periods, in order.
    pub fn period_labels(&self) -> Vec<&str> {
        self.periods
            .iter()
            .filter(|p| !p.is_break)
            .map(|p| p.label.as_str())
            .collect()
    }

    /// Label of a teaching period.
    pub fn period_label(&self, period: usize) -> Option<&str> {
        self.periods
            .iter()
            .filter(|p| !p.is_break)
            .nth(period)
            .map(|p| p.label.as_str())
    }

    /// Name of a day.
    pub fn day_name(&self, day: usize) -> Option<&str> {
        self.days.get(day).map(String::as_str)
    }

    /// Whether the slot addresses a teaching cell of this grid.
    pub fn contains(&self, slot: TimeSlot) -> bool {
        slot.day < self.day_count() && slot.period < self.periods_per_day()
    }

    /// Linear index of a slot, or `None` if outside the grid.
    pub fn index_of(&self, slot: TimeSlot) -> Option<usize> {
        if self.contains(slot) {
            Some(slot.day * self.periods_per_day() + slot.period)
        } else {
            None
        }
    }

    /// Slot at a linear index.
    pub fn slot_at(&self, index: usize) -> Option<TimeSlot> {
        let per_day = self.periods_per_day();
        if per_day == 0 || index >= self.slot_count() {
            return None;
        }
        Some(TimeSlot::new(index / per_day, index % per_day))
    }

    /// All slots in grid order (day, then period).
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        let per_day = self.periods_per_day();
        (0..self.day_count()).flat_map(move |d| (0..per_day).map(move |p| TimeSlot::new(d, p)))
    }

    /// Looks up a slot by day name and period label.
    pub fn find_slot(&self, day: &str, label: &str) -> Option<TimeSlot> {
        let d = self.days.iter().position(|n| n == day)?;
        let p = self.period_labels().iter().position(|l| *l == label)?;
        Some(TimeSlot::new(d, p))
    }

    /// Whether teaching period `period` and the next one form a
    /// contiguous same-day pair eligible for a double-length block.
    pub fn is_double_start(&self, period: usize) -> bool {
        let positions = self.teaching_positions();
        let adjacent = match (positions.get(period), positions.get(period + 1)) {
            (Some(&a), Some(&b)) => b == a + 1,
            _ => false,
        };
        if !adjacent {
            return false;
        }
        match &self.double_starts {
            None => true,
            Some(starts) => starts.contains(&period),
        }
    }

    /// Per-slot double-start table, indexed by linear slot index.
    pub fn double_start_table(&self) -> Vec<bool> {
        let per_day: Vec<bool> = (0..self.periods_per_day())
            .map(|p| self.is_double_start(p))
            .collect();
        (0..self.day_count())
            .flat_map(|_| per_day.iter().copied())
            .collect()
    }
}

impl Default for GridDefinition {
    fn default() -> Self {
        Self::standard()
    }
}
