//! Domain models shared by the ledger client and the engine

pub mod booking;
pub mod rating;
pub mod schedule;
pub mod slot;
pub mod teacher;

pub type BookingId = i64;
pub type TeacherId = i64;
pub type UserId = i64;

pub use booking::{
    Booking, BookingAction, BookingActionRequest, BookingReceipt, BookingStatus, NewBooking,
};
pub use rating::{NewRating, Rating, RatingValue};
pub use schedule::Schedule;
pub use slot::{SlotKey, SlotStatus};
pub use teacher::{RatedTeacher, Teacher, TeacherSummary};
