//! Rating prompt scheduling
//!
//! One priority queue of prompt deadlines replaces per-booking timers. The
//! queue is serviced by [`RatingPromptScheduler::tick`], which every caller
//! (deadline wake-up, periodic poll, booking refresh) goes through, so the
//! eligibility re-check happens in exactly one place.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use shared::models::{Booking, BookingId};
use shared::{AppError, AppResult, ErrorCode};

use super::state::SessionState;
use crate::utils::time::prompt_due_at;

/// Lifecycle of one booking's rating prompt
///
/// `Submitted` and `Dismissed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Scheduled { due_at: DateTime<Utc> },
    Shown,
    Submitted,
    Dismissed,
}

impl PromptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Dismissed)
    }
}

/// How a shown prompt was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Submitted,
    Dismissed,
}

pub struct RatingPromptScheduler {
    tz: Tz,
    delay: Duration,
    session: SessionState,
    bookings: HashMap<BookingId, Booking>,
    states: HashMap<BookingId, PromptState>,
    queue: BinaryHeap<Reverse<(DateTime<Utc>, BookingId)>>,
    shown: Option<BookingId>,
}

impl RatingPromptScheduler {
    pub fn new(tz: Tz, delay: Duration, session: SessionState) -> Self {
        Self {
            tz,
            delay,
            session,
            bookings: HashMap::new(),
            states: HashMap::new(),
            queue: BinaryHeap::new(),
            shown: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn state(&self, booking_id: BookingId) -> Option<PromptState> {
        self.states.get(&booking_id).copied()
    }

    /// Booking whose prompt is currently shown
    pub fn shown(&self) -> Option<&Booking> {
        self.shown.and_then(|id| self.bookings.get(&id))
    }

    /// Earliest armed deadline (may belong to a booking that no longer qualifies)
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|Reverse((due, _))| *due)
    }

    /// When the service loop should wake next
    ///
    /// While a prompt is shown due entries are deferred, so only the poll
    /// interval applies.
    pub fn next_wake(&self, now: DateTime<Utc>, poll: Duration) -> DateTime<Utc> {
        let poll_at = now + poll;
        match (self.shown, self.next_due()) {
            (None, Some(due)) => due.min(poll_at),
            _ => poll_at,
        }
    }

    /// Replace the loaded booking list and re-evaluate
    ///
    /// Bookings already tracked keep their state; the shown booking is kept
    /// even if the refreshed list no longer contains it.
    pub fn load_bookings(&mut self, bookings: Vec<Booking>, now: DateTime<Utc>) -> Option<Booking> {
        let incoming: HashSet<BookingId> = bookings.iter().map(|b| b.id).collect();
        self.bookings
            .retain(|id, _| incoming.contains(id) || Some(*id) == self.shown);
        for booking in bookings {
            let id = booking.id;
            self.bookings.insert(id, booking);
            self.arm(id);
        }
        self.tick(now)
    }

    /// Track a single (typically just created) booking
    pub fn schedule(&mut self, booking: Booking, now: DateTime<Utc>) -> Option<Booking> {
        let id = booking.id;
        self.bookings.insert(id, booking);
        self.arm(id);
        self.tick(now)
    }

    /// Periodic re-scan of every loaded booking
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Booking> {
        if self.shown.is_some() {
            return None;
        }
        let untracked: Vec<BookingId> = self
            .bookings
            .keys()
            .filter(|id| !self.states.contains_key(id))
            .copied()
            .collect();
        for id in untracked {
            self.arm(id);
        }
        self.tick(now)
    }

    /// Process every deadline that has passed
    ///
    /// Returns the booking that just became shown, if any. Does nothing while
    /// another prompt is shown; due entries stay queued until it resolves.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Booking> {
        if self.shown.is_some() {
            return None;
        }

        while let Some(Reverse((due, id))) = self.queue.peek().copied() {
            if due > now {
                break;
            }
            self.queue.pop();

            // Stale entry from an earlier arm of the same booking
            if self.states.get(&id) != Some(&PromptState::Scheduled { due_at: due }) {
                continue;
            }

            let Some(booking) = self.bookings.get(&id) else {
                // Missing from the latest list; armed again if it comes back
                tracing::debug!(booking_id = id, "Rating prompt due for an unloaded booking");
                self.states.remove(&id);
                continue;
            };
            if !self.session.is_eligible(booking) {
                tracing::debug!(booking_id = id, "Rating prompt no longer eligible");
                self.states.insert(id, PromptState::Dismissed);
                continue;
            }

            self.states.insert(id, PromptState::Shown);
            self.session.mark_shown(id);
            self.shown = Some(id);
            tracing::info!(booking_id = id, "Rating prompt shown");
            return self.bookings.get(&id).cloned();
        }
        None
    }

    /// Close the shown prompt
    ///
    /// The booking's teacher is suppressed for the rest of the session and the
    /// local record is updated so it stays ineligible until the next refresh.
    pub fn resolve(&mut self, resolution: Resolution, now: DateTime<Utc>) -> AppResult<Booking> {
        let id = self
            .shown
            .take()
            .ok_or_else(|| AppError::new(ErrorCode::NoActivePrompt))?;
        let booking = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::booking_not_found(id))?;

        match resolution {
            Resolution::Submitted => {
                booking.rated = true;
                self.states.insert(id, PromptState::Submitted);
            }
            Resolution::Dismissed => {
                booking.closed_time = Some(now);
                self.states.insert(id, PromptState::Dismissed);
            }
        }
        self.session.mark_teacher_rated(booking.teacher_id());
        self.session.mark_shown(id);
        tracing::info!(booking_id = id, ?resolution, "Rating prompt resolved");
        Ok(booking.clone())
    }

    fn arm(&mut self, id: BookingId) {
        if self.states.contains_key(&id) {
            return;
        }
        let Some(booking) = self.bookings.get(&id) else {
            return;
        };
        if !self.session.is_eligible(booking) {
            return;
        }
        let Some(due_at) = prompt_due_at(booking, self.tz, self.delay) else {
            tracing::warn!(booking_id = id, time = %booking.time, "Unparseable session time, prompt not scheduled");
            return;
        };
        self.states.insert(id, PromptState::Scheduled { due_at });
        self.queue.push(Reverse((due_at, id)));
        tracing::debug!(booking_id = id, due_at = %due_at, "Rating prompt scheduled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use shared::models::{BookingStatus, TeacherSummary};

    const CAIRO: Tz = chrono_tz::Africa::Cairo;

    fn booking(id: BookingId, teacher_id: i64, time: &str) -> Booking {
        Booking {
            id,
            teacher: TeacherSummary {
                id: teacher_id,
                name: format!("Teacher {}", teacher_id),
                subject: "Math".into(),
            },
            user_id: Some(1),
            subject: "Math".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: time.into(),
            place: "Room 1".into(),
            status: BookingStatus::Confirmed,
            rated: false,
            closed_time: None,
            created_at: None,
        }
    }

    /// Wall-clock instant in Cairo (UTC+2 in January)
    fn cairo(h: u32, m: u32) -> DateTime<Utc> {
        CAIRO
            .with_ymd_and_hms(2024, 1, 1, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn scheduler() -> RatingPromptScheduler {
        RatingPromptScheduler::new(CAIRO, Duration::hours(2), SessionState::new())
    }

    #[test]
    fn test_overdue_prompt_shows_immediately() {
        let mut s = scheduler();
        let shown = s.load_bookings(vec![booking(1, 3, "10:00 AM")], cairo(12, 30));
        assert_eq!(shown.map(|b| b.id), Some(1));
        assert_eq!(s.state(1), Some(PromptState::Shown));
        assert!(s.session().was_shown(1));
    }

    #[test]
    fn test_future_prompt_is_armed() {
        let mut s = scheduler();
        assert!(s.load_bookings(vec![booking(1, 3, "10:00 AM")], cairo(11, 0)).is_none());
        assert_eq!(
            s.state(1),
            Some(PromptState::Scheduled { due_at: cairo(12, 0) })
        );
        assert_eq!(s.next_due(), Some(cairo(12, 0)));
        assert!(s.tick(cairo(11, 59)).is_none());
        assert_eq!(s.tick(cairo(12, 0)).map(|b| b.id), Some(1));
    }

    #[test]
    fn test_rated_teacher_never_prompted() {
        let mut s = RatingPromptScheduler::new(
            CAIRO,
            Duration::hours(2),
            SessionState::with_rated_teachers([3]),
        );
        let loaded = vec![booking(1, 3, "08:00"), booking(2, 3, "09:00")];
        assert!(s.load_bookings(loaded, cairo(23, 0)).is_none());
        assert!(s.state(1).is_none());
        assert!(s.poll(cairo(23, 30)).is_none());
    }

    #[test]
    fn test_due_entry_rechecks_eligibility() {
        let mut s = scheduler();
        s.load_bookings(vec![booking(1, 3, "10:00 AM")], cairo(11, 0));

        // Closed elsewhere before the deadline
        let mut closed = booking(1, 3, "10:00 AM");
        closed.closed_time = Some(cairo(11, 30));
        s.load_bookings(vec![closed], cairo(11, 30));

        assert!(s.tick(cairo(12, 5)).is_none());
        assert_eq!(s.state(1), Some(PromptState::Dismissed));
    }

    #[test]
    fn test_one_prompt_at_a_time() {
        let mut s = scheduler();
        let loaded = vec![booking(1, 3, "08:00"), booking(2, 4, "09:00")];
        assert_eq!(s.load_bookings(loaded, cairo(18, 0)).map(|b| b.id), Some(1));

        // Second candidate waits while the first is shown
        assert!(s.poll(cairo(18, 1)).is_none());
        assert!(matches!(s.state(2), Some(PromptState::Scheduled { .. })));
        assert_eq!(s.next_wake(cairo(18, 1), Duration::seconds(60)), cairo(18, 2));

        let resolved = s.resolve(Resolution::Dismissed, cairo(18, 2)).unwrap();
        assert_eq!(resolved.id, 1);
        assert!(resolved.closed_time.is_some());
        assert_eq!(s.state(1), Some(PromptState::Dismissed));
        assert!(s.session().has_rated(3));

        assert_eq!(s.tick(cairo(18, 3)).map(|b| b.id), Some(2));
    }

    #[test]
    fn test_resolve_suppresses_other_bookings_of_teacher() {
        let mut s = scheduler();
        let loaded = vec![booking(1, 3, "08:00"), booking(2, 3, "09:00")];
        s.load_bookings(loaded, cairo(18, 0));
        s.resolve(Resolution::Submitted, cairo(18, 1)).unwrap();
        assert_eq!(s.state(1), Some(PromptState::Submitted));

        assert!(s.tick(cairo(18, 2)).is_none());
        assert_eq!(s.state(2), Some(PromptState::Dismissed));
    }

    #[test]
    fn test_resolve_without_prompt() {
        let mut s = scheduler();
        let err = s.resolve(Resolution::Submitted, cairo(9, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoActivePrompt);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let mut s = scheduler();
        let loaded = vec![booking(1, 3, "10:00 AM")];
        s.load_bookings(loaded.clone(), cairo(11, 0));
        s.load_bookings(loaded.clone(), cairo(11, 10));
        s.load_bookings(loaded, cairo(11, 20));
        assert_eq!(s.queue.len(), 1);
    }

    #[test]
    fn test_booking_missing_at_deadline_is_rearmed() {
        let mut s = scheduler();
        s.load_bookings(vec![booking(1, 3, "10:00 AM")], cairo(11, 0));
        s.load_bookings(Vec::new(), cairo(11, 30));

        assert!(s.tick(cairo(12, 30)).is_none());
        assert!(s.state(1).is_none());

        let shown = s.load_bookings(vec![booking(1, 3, "10:00 AM")], cairo(12, 40));
        assert_eq!(shown.map(|b| b.id), Some(1));
        assert_eq!(s.state(1), Some(PromptState::Shown));
    }

    #[test]
    fn test_unparseable_time_is_skipped() {
        let mut s = scheduler();
        assert!(s.load_bookings(vec![booking(1, 3, "after lunch")], cairo(23, 0)).is_none());
        assert!(s.state(1).is_none());
        assert!(s.next_due().is_none());
    }
}
