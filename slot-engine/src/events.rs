//! Session events
//!
//! Published on a `tokio::sync::broadcast` channel owned by the session.
//! Slow subscribers lag and skip events; nothing in the engine depends on
//! every event being observed.

use serde::Serialize;
use shared::models::{Booking, BookingId, TeacherId};
use tokio::sync::broadcast;

use crate::alerts::AlertBanners;
use crate::rating::Resolution;

/// Default broadcast channel capacity
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Fresh booking list fetched from the ledger
    BookingsChanged { bookings: Vec<Booking> },
    PromptShown { booking: Booking },
    PromptResolved {
        booking_id: BookingId,
        teacher_id: TeacherId,
        resolution: Resolution,
        /// Every ledger call behind the resolution succeeded
        synced: bool,
    },
    AlertsChanged { banners: AlertBanners },
}

pub fn channel() -> (broadcast::Sender<SessionEvent>, broadcast::Receiver<SessionEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
