//! Slot capacity
//!
//! Occupancy accounting for teacher slots and the admission rule applied to
//! new bookings.

mod resolver;

pub use resolver::{SlotCapacityResolver, SlotStatusMap};

use shared::models::BookingStatus;

/// Initial status of a new booking given the slot's pre-insert occupancy
///
/// A full slot waitlists the booking; it is never rejected.
pub fn admission_status(occupancy: u32, capacity: u32) -> BookingStatus {
    if occupancy < capacity {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_status() {
        assert_eq!(admission_status(0, 1), BookingStatus::Confirmed);
        assert_eq!(admission_status(1, 1), BookingStatus::Pending);
        assert_eq!(admission_status(2, 3), BookingStatus::Confirmed);
        assert_eq!(admission_status(5, 3), BookingStatus::Pending);
    }
}
