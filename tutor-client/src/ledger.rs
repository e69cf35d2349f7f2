//! Booking ledger over the HTTP API

use async_trait::async_trait;
use serde::Serialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::ledger::BookingLedger;
use shared::models::{
    Booking, BookingAction, BookingActionRequest, BookingId, BookingReceipt, NewBooking, NewRating,
    RatedTeacher, Rating, RatingValue, SlotKey, Teacher, TeacherId,
};

use crate::HttpClient;

/// [`BookingLedger`] backed by the remote booking API
///
/// | Operation | Endpoint |
/// |-----------|----------|
/// | `get_teacher` | `GET teacher/{id}` |
/// | `list_bookings_for_slot` | `GET teacher/{id}/bookings-by-slot?date&time&place` |
/// | `create_booking` | `POST booking` |
/// | `update_booking_status` | `PATCH booking/{id}` |
/// | `list_bookings_for_user` | `GET booking` |
/// | `list_rated_teachers` | `GET rated-teacher` |
/// | `record_rated_teacher` | `POST rated-teacher` |
/// | `submit_rating` | `POST rating` |
#[derive(Debug, Clone)]
pub struct HttpLedger {
    http: HttpClient,
}

#[derive(Serialize)]
struct SlotQuery<'a> {
    date: String,
    time: &'a str,
    place: &'a str,
}

#[derive(Serialize)]
struct RatedTeacherRequest {
    teacher_id: TeacherId,
}

impl HttpLedger {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn client(&self) -> &HttpClient {
        &self.http
    }

    /// Full record for a `{id, status}` booking reply
    ///
    /// The booking already exists at this point, so a failed list lookup
    /// falls back to the request fields instead of reporting an error.
    async fn complete_receipt(&self, request: &NewBooking, reply: Value) -> AppResult<Booking> {
        let receipt: BookingReceipt = serde_json::from_value(reply)
            .map_err(|e| AppError::with_message(ErrorCode::InvalidFormat, e.to_string()))?;

        let listed = match self.list_bookings_for_user().await {
            Ok(bookings) => bookings.into_iter().find(|b| b.id == receipt.id),
            Err(e) => {
                tracing::warn!(booking_id = receipt.id, error = %e, "Booking list unavailable after create");
                None
            }
        };
        Ok(listed.unwrap_or_else(|| request.clone().into_booking(receipt.id, receipt.status)))
    }
}

#[async_trait]
impl BookingLedger for HttpLedger {
    async fn get_teacher(&self, teacher_id: TeacherId) -> AppResult<Teacher> {
        Ok(self.http.get(&format!("teacher/{}", teacher_id)).await?)
    }

    async fn create_booking(&self, booking: &NewBooking) -> AppResult<Booking> {
        let reply: Value = self.http.post("booking", booking).await?;
        let created = match serde_json::from_value::<Booking>(reply.clone()) {
            Ok(created) => created,
            Err(_) => self.complete_receipt(booking, reply).await?,
        };
        tracing::info!(
            booking_id = created.id,
            status = %created.status,
            slot = %created.slot(),
            "Booking created"
        );
        Ok(created)
    }

    async fn list_bookings_for_slot(&self, slot: &SlotKey) -> AppResult<Vec<Booking>> {
        let query = SlotQuery {
            date: slot.date.format("%Y-%m-%d").to_string(),
            time: &slot.time,
            place: &slot.place,
        };
        let path = format!("teacher/{}/bookings-by-slot", slot.teacher_id);
        Ok(self.http.get_with_query(&path, &query).await?)
    }

    async fn list_bookings_for_user(&self) -> AppResult<Vec<Booking>> {
        Ok(self.http.get("booking").await?)
    }

    async fn update_booking_status(
        &self,
        booking_id: BookingId,
        action: BookingAction,
    ) -> AppResult<Booking> {
        let body = BookingActionRequest { action };
        let reply: Value = self
            .http
            .patch(&format!("booking/{}", booking_id), &body)
            .await?;

        // Some deployments answer with `{"detail": ...}` instead of the record
        match serde_json::from_value::<Booking>(reply) {
            Ok(booking) => Ok(booking),
            Err(_) => self
                .list_bookings_for_user()
                .await?
                .into_iter()
                .find(|b| b.id == booking_id)
                .ok_or_else(|| AppError::booking_not_found(booking_id)),
        }
    }

    async fn list_rated_teachers(&self) -> AppResult<Vec<TeacherId>> {
        let rated: Vec<RatedTeacher> = self.http.get("rated-teacher").await?;
        Ok(rated.into_iter().map(|r| r.teacher_id).collect())
    }

    async fn record_rated_teacher(&self, teacher_id: TeacherId) -> AppResult<()> {
        let _: IgnoredAny = self
            .http
            .post("rated-teacher", &RatedTeacherRequest { teacher_id })
            .await?;
        Ok(())
    }

    async fn submit_rating(
        &self,
        teacher_id: TeacherId,
        rating: RatingValue,
    ) -> AppResult<Rating> {
        Ok(self
            .http
            .post("rating", &NewRating { teacher_id, rating })
            .await?)
    }
}
