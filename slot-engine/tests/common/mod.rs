//! Fixtures shared by the integration tests
#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use shared::models::{NewBooking, Schedule, Teacher, TeacherId};
use slot_engine::{InMemoryLedger, ManualClock};

pub const CAIRO: Tz = chrono_tz::Africa::Cairo;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Wall-clock instant in Cairo (UTC+2 in January)
pub fn cairo(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    CAIRO
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Math teacher with one slot today and one next week
pub fn math_teacher(id: TeacherId, capacity: u32) -> Teacher {
    Teacher {
        id,
        name: format!("Teacher {}", id),
        subject: "Math".into(),
        schedule: Schedule::new()
            .with_entry(date(2024, 1, 1), "10:00 AM", "Room 1")
            .with_entry(date(2024, 1, 10), "10:00 AM", "Room 1")
            .with_entry(date(2024, 1, 10), "2:00 PM", "Hall B"),
        max_students_per_group: NonZeroU32::new(capacity).unwrap(),
    }
}

pub fn request(teacher_id: TeacherId, day: u32, time: &str, place: &str) -> NewBooking {
    NewBooking {
        teacher_id,
        subject: "Math".into(),
        date: date(2024, 1, day),
        time: time.into(),
        place: place.into(),
    }
}

/// Ledger and clock starting at 2024-01-01 09:00 Cairo
pub fn ledger_at_nine() -> (InMemoryLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(cairo(2024, 1, 1, 9, 0)));
    let ledger = InMemoryLedger::with_clock(CAIRO, clock.clone());
    (ledger, clock)
}
