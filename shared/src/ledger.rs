//! Booking ledger contract
//!
//! The ledger is the system of record for bookings and ratings. The engine
//! only talks to it through [`BookingLedger`], whether the records live
//! behind the HTTP API or in process memory.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    Booking, BookingAction, BookingId, NewBooking, Rating, RatingValue, SlotKey, Teacher,
    TeacherId,
};

/// Every call is a fallible network round-trip and must not block others
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Teacher with schedule and per-group capacity
    async fn get_teacher(&self, teacher_id: TeacherId) -> AppResult<Teacher>;

    /// Create a booking; the ledger decides `confirmed` vs `pending`
    async fn create_booking(&self, booking: &NewBooking) -> AppResult<Booking>;

    /// Bookings currently held at one slot
    async fn list_bookings_for_slot(&self, slot: &SlotKey) -> AppResult<Vec<Booking>>;

    /// All bookings of the authenticated learner
    async fn list_bookings_for_user(&self) -> AppResult<Vec<Booking>>;

    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        action: BookingAction,
    ) -> AppResult<Booking>;

    /// Teachers the authenticated learner has already rated or dismissed
    async fn list_rated_teachers(&self) -> AppResult<Vec<TeacherId>>;

    async fn record_rated_teacher(&self, teacher_id: TeacherId) -> AppResult<()>;

    async fn submit_rating(&self, teacher_id: TeacherId, rating: RatingValue)
    -> AppResult<Rating>;
}
