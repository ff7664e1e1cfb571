//! Room pool.
//!
//! Rooms are optional. An empty pool disables room tracking; a
//! non-empty pool makes every placement reserve one room for each of
//! its slots. Rooms are preferred in pool order, so the first free room
//! always wins.

use serde::{Deserialize, Serialize};

/// Ordered set of room identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomPool {
    rooms: Vec<String>,
}

impl RoomPool {
    /// Creates a pool from room identifiers, in preference order.
    pub fn new(rooms: Vec<String>) -> Self {
        Self { rooms }
    }

    /// An empty pool (room tracking disabled).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// `count` rooms labelled `"{prefix} {first}"`, `"{prefix} {first + 1}"`, ...
    ///
    /// `RoomPool::numbered("Room", 101, 20)` yields "Room 101".."Room 120".
    pub fn numbered(prefix: &str, first: u32, count: u32) -> Self {
        let rooms = (first..first.saturating_add(count))
            .map(|n| format!("{prefix} {n}"))
            .collect();
        Self { rooms }
    }

    /// Adds a room at the lowest preference.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.rooms.push(room.into());
        self
    }

    /// Whether room conflicts are checked.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.rooms.is_empty()
    }

    /// Number of rooms.
    #[inline]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the pool is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Room identifier at a pool position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.rooms.get(index).map(String::as_str)
    }

    /// Whether a room belongs to the pool.
    pub fn contains(&self, room: &str) -> bool {
        self.rooms.iter().any(|r| r == room)
    }

    /// Rooms in preference order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(String::as_str)
    }
}
