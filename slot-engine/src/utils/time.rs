//! Reference-timezone helpers
//!
//! Session dates and time labels are wall-clock values in one fixed zone,
//! independent of where the engine runs. Everything is converted to UTC
//! before it is compared or scheduled.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use shared::models::Booking;
use shared::{AppError, AppResult};

/// Parse an IANA timezone name (e.g. `Africa/Cairo`)
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::config(format!("Unknown timezone: {}", name)))
}

/// Local wall-clock time in `tz` → UTC instant
///
/// DST overlap resolves to the later instant; a DST gap falls back to
/// reading the wall-clock value as UTC.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Session start of a booking, `None` when its time label does not parse
pub fn session_start_utc(booking: &Booking, tz: Tz) -> Option<DateTime<Utc>> {
    booking.session_start().map(|naive| local_to_utc(naive, tz))
}

/// Instant the rating prompt for `booking` becomes due
pub fn prompt_due_at(booking: &Booking, tz: Tz, delay: Duration) -> Option<DateTime<Utc>> {
    session_start_utc(booking, tz).map(|start| start + delay)
}

/// `deadline - now` as a sleep duration, zero once passed
pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (deadline - now).to_std().unwrap_or(std::time::Duration::ZERO)
}
