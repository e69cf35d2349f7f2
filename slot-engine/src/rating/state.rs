use std::collections::HashSet;

use shared::models::{Booking, BookingId, TeacherId};

/// Per-session dedup sets consulted before any rating prompt is shown
///
/// `rated_teachers` is seeded from the ledger at session start;
/// `shown_popups` lives only as long as the session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    rated_teachers: HashSet<TeacherId>,
    shown_popups: HashSet<BookingId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rated_teachers(teachers: impl IntoIterator<Item = TeacherId>) -> Self {
        Self {
            rated_teachers: teachers.into_iter().collect(),
            shown_popups: HashSet::new(),
        }
    }

    /// Whether a prompt may still be shown for `booking`
    pub fn is_eligible(&self, booking: &Booking) -> bool {
        !booking.rated
            && booking.closed_time.is_none()
            && !self.rated_teachers.contains(&booking.teacher_id())
            && !self.shown_popups.contains(&booking.id)
    }

    pub fn mark_teacher_rated(&mut self, teacher_id: TeacherId) {
        self.rated_teachers.insert(teacher_id);
    }

    pub fn extend_rated_teachers(&mut self, teachers: impl IntoIterator<Item = TeacherId>) {
        self.rated_teachers.extend(teachers);
    }

    pub fn mark_shown(&mut self, booking_id: BookingId) {
        self.shown_popups.insert(booking_id);
    }

    pub fn has_rated(&self, teacher_id: TeacherId) -> bool {
        self.rated_teachers.contains(&teacher_id)
    }

    pub fn was_shown(&self, booking_id: BookingId) -> bool {
        self.shown_popups.contains(&booking_id)
    }
}
