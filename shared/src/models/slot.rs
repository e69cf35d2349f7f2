//! Slot (derived, never persisted)

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TeacherId;

/// Identity of one bookable session opportunity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub teacher_id: TeacherId,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
}

impl SlotKey {
    pub fn new(
        teacher_id: TeacherId,
        date: NaiveDate,
        time: impl Into<String>,
        place: impl Into<String>,
    ) -> Self {
        Self {
            teacher_id,
            date,
            time: time.into(),
            place: place.into(),
        }
    }

    /// Key used in slot status maps: `date|time|place`
    pub fn map_key(&self) -> String {
        format!("{}|{}|{}", self.date.format("%Y-%m-%d"), self.time, self.place)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "teacher {} @ {}", self.teacher_id, self.map_key())
    }
}

/// Occupancy snapshot of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    /// Non-cancelled bookings at the slot
    pub occupancy: u32,
    pub capacity: u32,
    pub is_full: bool,
    /// Set when the occupancy query failed and the counts are placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SlotStatus {
    pub fn from_counts(occupancy: u32, capacity: u32) -> Self {
        Self {
            occupancy,
            capacity,
            is_full: occupancy >= capacity,
            warning: None,
        }
    }

    /// Placeholder for a slot whose occupancy could not be fetched
    pub fn degraded(capacity: u32, warning: impl Into<String>) -> Self {
        Self {
            occupancy: 0,
            capacity,
            is_full: false,
            warning: Some(warning.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }

    /// Seats left before the slot starts waitlisting
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.occupancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key_format() {
        let key = SlotKey::new(1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "10:00 AM", "Room 1");
        assert_eq!(key.map_key(), "2024-01-01|10:00 AM|Room 1");
        assert_eq!(key.to_string(), "teacher 1 @ 2024-01-01|10:00 AM|Room 1");
    }

    #[test]
    fn test_is_full_threshold() {
        for capacity in 1..=5u32 {
            for occupancy in 0..=7u32 {
                let status = SlotStatus::from_counts(occupancy, capacity);
                assert_eq!(status.is_full, occupancy >= capacity);
            }
        }
    }

    #[test]
    fn test_degraded_status() {
        let status = SlotStatus::degraded(3, "timeout");
        assert_eq!(status.occupancy, 0);
        assert!(!status.is_full);
        assert!(status.is_degraded());
        assert_eq!(status.remaining(), 3);
    }
}
