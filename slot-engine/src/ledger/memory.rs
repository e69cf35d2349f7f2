//! In-process booking ledger
//!
//! Holds teachers, bookings and ratings in memory and applies the same rules
//! as the booking API: schedule validation, capacity admission with a
//! waitlist, the 48 hour cancellation window and waitlist promotion.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use chrono_tz::Tz;
use parking_lot::Mutex;
use shared::ledger::BookingLedger;
use shared::models::{
    Booking, BookingAction, BookingId, BookingStatus, NewBooking, Rating, RatingValue, SlotKey,
    Teacher, TeacherId, TeacherSummary, UserId,
};
use shared::{AppError, AppResult, ErrorCode};

use crate::capacity::admission_status;
use crate::core::{Clock, SystemClock};
use crate::utils::time::session_start_utc;

/// Minimum notice for a learner-initiated cancellation
const CANCELLATION_NOTICE_HOURS: i64 = 48;

#[derive(Default)]
struct Store {
    teachers: HashMap<TeacherId, Teacher>,
    bookings: BTreeMap<BookingId, Booking>,
    rated: HashMap<UserId, BTreeSet<TeacherId>>,
    ratings: Vec<(UserId, Rating)>,
    next_booking_id: BookingId,
    next_rating_id: i64,
}

impl Store {
    fn teacher(&self, teacher_id: TeacherId) -> AppResult<&Teacher> {
        self.teachers
            .get(&teacher_id)
            .ok_or_else(|| AppError::teacher_not_found(teacher_id))
    }

    fn at_slot<'a>(&'a self, slot: &'a SlotKey) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.values().filter(move |b| b.is_at(slot))
    }

    fn seated(&self, slot: &SlotKey) -> u32 {
        let count = self.at_slot(slot).filter(|b| b.status.holds_seat()).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Promote the oldest waitlisted booking if the slot has a free seat
    fn promote_waitlisted(&mut self, slot: &SlotKey) -> Option<BookingId> {
        let capacity = self.teachers.get(&slot.teacher_id)?.capacity();
        if self.seated(slot) >= capacity {
            return None;
        }
        let next = self
            .at_slot(slot)
            .filter(|b| b.status == BookingStatus::Pending)
            .min_by_key(|b| (b.created_at, b.id))
            .map(|b| b.id)?;
        let booking = self.bookings.get_mut(&next)?;
        booking.status = BookingStatus::Confirmed;
        Some(next)
    }
}

/// [`BookingLedger`] held in process memory
///
/// Cloning or calling [`InMemoryLedger::for_user`] shares the same store, so
/// several learners can book against one ledger.
#[derive(Clone)]
pub struct InMemoryLedger {
    store: Arc<Mutex<Store>>,
    user_id: UserId,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    pub fn new(tz: Tz) -> Self {
        Self::with_clock(tz, Arc::new(SystemClock))
    }

    pub fn with_clock(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                next_booking_id: 1,
                next_rating_id: 1,
                ..Store::default()
            })),
            user_id: 1,
            tz,
            clock,
        }
    }

    /// View of the same store acting as another learner
    pub fn for_user(&self, user_id: UserId) -> Self {
        Self {
            user_id,
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Add or replace a teacher
    ///
    /// Raising the capacity of a known teacher confirms waitlisted bookings
    /// into the new seats, oldest first, slot by slot.
    pub fn insert_teacher(&self, teacher: Teacher) {
        let mut store = self.store.lock();
        let grew = store
            .teachers
            .get(&teacher.id)
            .is_some_and(|old| teacher.capacity() > old.capacity());
        let slots = teacher.slots();
        store.teachers.insert(teacher.id, teacher);
        if !grew {
            return;
        }
        for slot in &slots {
            while let Some(promoted) = store.promote_waitlisted(slot) {
                tracing::info!(booking_id = promoted, slot = %slot, "Waitlisted booking confirmed after capacity increase");
            }
        }
    }

    /// Operator-side status change (teacher rescheduled or called off a session)
    pub fn set_status(&self, booking_id: BookingId, status: BookingStatus) -> AppResult<Booking> {
        let mut store = self.store.lock();
        let booking = store
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::booking_not_found(booking_id))?;
        booking.status = status;
        tracing::info!(booking_id, status = %status, "Booking status set by operator");
        Ok(booking.clone())
    }

    pub fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.store.lock().bookings.get(&booking_id).cloned()
    }

    /// Ratings left for `teacher_id`, by any learner
    pub fn ratings_for(&self, teacher_id: TeacherId) -> Vec<Rating> {
        self.store
            .lock()
            .ratings
            .iter()
            .filter(|(_, r)| r.teacher_id == teacher_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn cancel(&self, store: &mut Store, booking_id: BookingId) -> AppResult<Booking> {
        let booking = store
            .bookings
            .get(&booking_id)
            .ok_or_else(|| AppError::booking_not_found(booking_id))?;
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::new(ErrorCode::BookingAlreadyCancelled)
                .with_detail("booking_id", booking_id));
        }

        let starts = session_start_utc(booking, self.tz).ok_or_else(|| {
            AppError::new(ErrorCode::InvalidTimeLabel).with_detail("time", booking.time.clone())
        })?;
        if starts - self.clock.now() < Duration::hours(CANCELLATION_NOTICE_HOURS) {
            return Err(AppError::new(ErrorCode::CancellationWindowClosed)
                .with_detail("booking_id", booking_id));
        }

        let slot = booking.slot();
        if let Some(booking) = store.bookings.get_mut(&booking_id) {
            booking.status = BookingStatus::Cancelled;
        }
        if let Some(promoted) = store.promote_waitlisted(&slot) {
            tracing::info!(booking_id = promoted, slot = %slot, "Waitlisted booking confirmed");
        }
        store
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| AppError::booking_not_found(booking_id))
    }
}

#[async_trait]
impl BookingLedger for InMemoryLedger {
    async fn get_teacher(&self, teacher_id: TeacherId) -> AppResult<Teacher> {
        self.store.lock().teacher(teacher_id).cloned()
    }

    async fn create_booking(&self, request: &NewBooking) -> AppResult<Booking> {
        let mut store = self.store.lock();
        let teacher = store.teacher(request.teacher_id)?;

        match teacher.schedule.place_for(request.date, &request.time) {
            None => return Err(AppError::new(ErrorCode::SlotNotInSchedule)),
            Some(place) if place != request.place => {
                return Err(AppError::new(ErrorCode::PlaceMismatch).with_detail("place", place));
            }
            Some(_) => {}
        }
        if request.subject != teacher.subject {
            return Err(AppError::new(ErrorCode::SubjectMismatch)
                .with_detail("subject", teacher.subject.clone()));
        }

        let slot = request.slot();
        let duplicate = store.at_slot(&slot).any(|b| {
            b.user_id == Some(self.user_id)
                && matches!(b.status, BookingStatus::Confirmed | BookingStatus::Modified)
        });
        if duplicate {
            return Err(AppError::new(ErrorCode::AlreadyBooked));
        }

        let status = admission_status(store.seated(&slot), teacher.capacity());
        let summary = TeacherSummary::from(teacher);
        let id = store.next_booking_id;
        store.next_booking_id += 1;

        let booking = Booking {
            id,
            teacher: summary,
            user_id: Some(self.user_id),
            subject: request.subject.clone(),
            date: request.date,
            time: request.time.clone(),
            place: request.place.clone(),
            status,
            rated: false,
            closed_time: None,
            created_at: Some(self.clock.now()),
        };
        store.bookings.insert(id, booking.clone());
        tracing::info!(booking_id = id, status = %status, slot = %slot, "Booking created");
        Ok(booking)
    }

    async fn list_bookings_for_slot(&self, slot: &SlotKey) -> AppResult<Vec<Booking>> {
        let store = self.store.lock();
        store.teacher(slot.teacher_id)?;
        Ok(store
            .at_slot(slot)
            .filter(|b| b.status.holds_seat())
            .cloned()
            .collect())
    }

    async fn list_bookings_for_user(&self) -> AppResult<Vec<Booking>> {
        let store = self.store.lock();
        let mut bookings: Vec<Booking> = store
            .bookings
            .values()
            .filter(|b| b.user_id == Some(self.user_id))
            .cloned()
            .collect();
        // Newest first
        bookings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        action: BookingAction,
    ) -> AppResult<Booking> {
        let mut store = self.store.lock();
        let owned = store
            .bookings
            .get(&booking_id)
            .is_some_and(|b| b.user_id == Some(self.user_id));
        if !owned {
            return Err(AppError::booking_not_found(booking_id));
        }

        if action == BookingAction::Cancel {
            return self.cancel(&mut store, booking_id);
        }

        let now = self.clock.now();
        let booking = store
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::booking_not_found(booking_id))?;
        match action {
            BookingAction::MarkRated => booking.rated = true,
            BookingAction::ClosePopup => booking.closed_time = Some(now),
            BookingAction::Cancel => {}
        }
        tracing::debug!(booking_id, action = %action, "Booking updated");
        Ok(booking.clone())
    }

    async fn list_rated_teachers(&self) -> AppResult<Vec<TeacherId>> {
        let store = self.store.lock();
        Ok(store
            .rated
            .get(&self.user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn record_rated_teacher(&self, teacher_id: TeacherId) -> AppResult<()> {
        let mut store = self.store.lock();
        store.teacher(teacher_id)?;
        store.rated.entry(self.user_id).or_default().insert(teacher_id);
        Ok(())
    }

    async fn submit_rating(
        &self,
        teacher_id: TeacherId,
        rating: RatingValue,
    ) -> AppResult<Rating> {
        let mut store = self.store.lock();
        store.teacher(teacher_id)?;
        let id = store.next_rating_id;
        store.next_rating_id += 1;
        let record = Rating {
            id,
            teacher_id,
            rating,
            created_at: Some(self.clock.now()),
        };
        store.ratings.push((self.user_id, record.clone()));
        tracing::info!(teacher_id, rating = rating.get(), "Rating submitted");
        Ok(record)
    }
}
