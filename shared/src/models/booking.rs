//! Booking Model

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slot::SlotKey;
use super::teacher::TeacherSummary;
use super::{BookingId, TeacherId, UserId};
use crate::util::parse_time_label;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Accepted beyond capacity (waitlisted)
    Pending,
    Confirmed,
    /// Teacher changed the session after booking
    Modified,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Counts toward slot occupancy
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Holds a seat at the slot (waitlisted and finished bookings do not)
    pub fn holds_seat(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Modified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Modified => "modified",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking record as returned by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub teacher: TeacherSummary,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub subject: String,
    pub date: NaiveDate,
    /// Time label exactly as published in the teacher's schedule
    pub time: String,
    pub place: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub rated: bool,
    /// Set when the rating popup was explicitly dismissed
    #[serde(default)]
    pub closed_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn teacher_id(&self) -> TeacherId {
        self.teacher.id
    }

    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.teacher.id, self.date, self.time.clone(), self.place.clone())
    }

    pub fn is_at(&self, slot: &SlotKey) -> bool {
        self.teacher.id == slot.teacher_id
            && self.date == slot.date
            && self.time == slot.time
            && self.place == slot.place
    }

    /// Wall-clock session start, `None` if the time label is malformed
    pub fn session_start(&self) -> Option<NaiveDateTime> {
        parse_time_label(&self.time).map(|t| self.date.and_time(t))
    }
}

/// Body of `POST booking`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub teacher_id: TeacherId,
    pub subject: String,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
}

impl NewBooking {
    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.teacher_id, self.date, self.time.clone(), self.place.clone())
    }

    /// Booking record for a request the ledger accepted as `id` with `status`
    ///
    /// Only the teacher id is known; name and subject stay empty until the
    /// next refresh.
    pub fn into_booking(self, id: BookingId, status: BookingStatus) -> Booking {
        Booking {
            id,
            teacher: TeacherSummary {
                id: self.teacher_id,
                ..TeacherSummary::default()
            },
            user_id: None,
            subject: self.subject,
            date: self.date,
            time: self.time,
            place: self.place,
            status,
            rated: false,
            closed_time: None,
            created_at: None,
        }
    }
}

/// Reply of `POST booking`: only the id and the admission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub id: BookingId,
    pub status: BookingStatus,
}

/// Mutations accepted by `PATCH booking/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    MarkRated,
    ClosePopup,
    Cancel,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkRated => "mark_rated",
            Self::ClosePopup => "close_popup",
            Self::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `PATCH booking/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingActionRequest {
    pub action: BookingAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn booking_json() -> &'static str {
        r#"{
            "id": 12,
            "teacher": {"id": 3, "name": "Omar", "subject": "Math"},
            "subject": "Math",
            "date": "2024-01-01",
            "time": "10:00 AM",
            "place": "Room 1",
            "status": "confirmed",
            "rated": false,
            "closed_time": null
        }"#
    }

    #[test]
    fn test_booking_deserialize() {
        let booking: Booking = serde_json::from_str(booking_json()).unwrap();
        assert_eq!(booking.teacher_id(), 3);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.closed_time.is_none());
        assert!(booking.user_id.is_none());
        assert_eq!(booking.slot().map_key(), "2024-01-01|10:00 AM|Room 1");
    }

    #[test]
    fn test_session_start() {
        let booking: Booking = serde_json::from_str(booking_json()).unwrap();
        let start = booking.session_start().unwrap();
        assert_eq!(start.time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());

        let mut broken = booking;
        broken.time = "soon".into();
        assert!(broken.session_start().is_none());
    }

    #[test]
    fn test_status_seat_semantics() {
        assert!(BookingStatus::Pending.occupies_slot());
        assert!(!BookingStatus::Pending.holds_seat());
        assert!(BookingStatus::Modified.holds_seat());
        assert!(BookingStatus::Completed.occupies_slot());
        assert!(!BookingStatus::Completed.holds_seat());
        assert!(!BookingStatus::Cancelled.occupies_slot());
        assert!(!BookingStatus::Cancelled.holds_seat());
    }

    #[test]
    fn test_receipt_into_booking() {
        let receipt: BookingReceipt =
            serde_json::from_str(r#"{"id": 10, "status": "pending"}"#).unwrap();
        let request = NewBooking {
            teacher_id: 3,
            subject: "Math".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: "10:00 AM".into(),
            place: "Room 1".into(),
        };
        let slot = request.slot();

        let booking = request.into_booking(receipt.id, receipt.status);
        assert_eq!(booking.id, 10);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.teacher_id(), 3);
        assert!(booking.is_at(&slot));
        assert!(!booking.rated);
    }

    #[test]
    fn test_action_wire_format() {
        let body = BookingActionRequest {
            action: BookingAction::ClosePopup,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"action":"close_popup"}"#
        );
        let parsed: BookingActionRequest =
            serde_json::from_str(r#"{"action":"mark_rated"}"#).unwrap();
        assert_eq!(parsed.action, BookingAction::MarkRated);
        assert!(serde_json::from_str::<BookingActionRequest>(r#"{"action":"delete"}"#).is_err());
    }
}
