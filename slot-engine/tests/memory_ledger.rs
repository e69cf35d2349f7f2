mod common;

use chrono::Duration;
use common::{ledger_at_nine, math_teacher, request};
use shared::ErrorCode;
use shared::ledger::BookingLedger;
use shared::models::{BookingAction, BookingStatus, RatingValue};

#[tokio::test]
async fn test_capacity_one_waitlists_second_learner() {
    let (ledger, _clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 1));
    let other = ledger.for_user(2);

    let first = ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();
    let second = other.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();

    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(second.status, BookingStatus::Pending);
    assert_eq!(second.user_id, Some(2));

    // Waitlisted bookings hold no seat
    let seated = ledger.list_bookings_for_slot(&first.slot()).await.unwrap();
    assert_eq!(seated.len(), 1);
    assert_eq!(seated[0].id, first.id);
}

#[tokio::test]
async fn test_booking_validation_order() {
    let (ledger, _clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));

    let err = ledger.create_booking(&request(9, 10, "10:00 AM", "Room 1")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TeacherNotFound);

    let err = ledger.create_booking(&request(3, 10, "11:00 AM", "Room 1")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SlotNotInSchedule);

    let err = ledger.create_booking(&request(3, 10, "10:00 AM", "Hall B")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PlaceMismatch);

    let mut wrong_subject = request(3, 10, "10:00 AM", "Room 1");
    wrong_subject.subject = "Chemistry".into();
    let err = ledger.create_booking(&wrong_subject).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SubjectMismatch);
}

#[tokio::test]
async fn test_duplicate_booking_rejected() {
    let (ledger, _clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 5));

    ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();
    let err = ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyBooked);

    // A different slot of the same teacher is fine
    let other = ledger.create_booking(&request(3, 10, "2:00 PM", "Hall B")).await.unwrap();
    assert_eq!(other.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_cancel_promotes_oldest_waitlisted() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 1));
    let slot_request = request(3, 10, "10:00 AM", "Room 1");

    let seated = ledger.create_booking(&slot_request).await.unwrap();
    clock.advance(Duration::minutes(1));
    let older = ledger.for_user(2).create_booking(&slot_request).await.unwrap();
    clock.advance(Duration::minutes(1));
    let newer = ledger.for_user(3).create_booking(&slot_request).await.unwrap();

    let cancelled = ledger
        .update_booking_status(seated.id, BookingAction::Cancel)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(ledger.booking(older.id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(ledger.booking(newer.id).unwrap().status, BookingStatus::Pending);

    let err = ledger
        .update_booking_status(seated.id, BookingAction::Cancel)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingAlreadyCancelled);
}

#[tokio::test]
async fn test_cancel_needs_48_hours_notice() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let booking = ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();

    // 2024-01-08 11:00 Cairo is 47 hours before the session
    clock.set(common::cairo(2024, 1, 8, 11, 0));
    let err = ledger
        .update_booking_status(booking.id, BookingAction::Cancel)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CancellationWindowClosed);
    assert_eq!(ledger.booking(booking.id).unwrap().status, BookingStatus::Confirmed);

    clock.set(common::cairo(2024, 1, 8, 10, 0));
    let ok = ledger
        .update_booking_status(booking.id, BookingAction::Cancel)
        .await
        .unwrap();
    assert_eq!(ok.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_other_learners_booking_is_not_found() {
    let (ledger, _clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let booking = ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();

    let err = ledger
        .for_user(2)
        .update_booking_status(booking.id, BookingAction::MarkRated)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingNotFound);
}

#[tokio::test]
async fn test_popup_actions_and_ratings() {
    let (ledger, _clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let booking = ledger.create_booking(&request(3, 1, "10:00 AM", "Room 1")).await.unwrap();

    let rated = ledger
        .update_booking_status(booking.id, BookingAction::MarkRated)
        .await
        .unwrap();
    assert!(rated.rated);
    let closed = ledger
        .update_booking_status(booking.id, BookingAction::ClosePopup)
        .await
        .unwrap();
    assert!(closed.closed_time.is_some());

    ledger.record_rated_teacher(3).await.unwrap();
    ledger.record_rated_teacher(3).await.unwrap();
    assert_eq!(ledger.list_rated_teachers().await.unwrap(), vec![3]);
    assert!(ledger.for_user(2).list_rated_teachers().await.unwrap().is_empty());

    let first = ledger.submit_rating(3, RatingValue::new(4).unwrap()).await.unwrap();
    let second = ledger.submit_rating(3, RatingValue::new(5).unwrap()).await.unwrap();
    assert_eq!(second.id, first.id + 1);
    assert_eq!(ledger.ratings_for(3).len(), 2);
}

#[tokio::test]
async fn test_user_bookings_newest_first() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let older = ledger.create_booking(&request(3, 10, "10:00 AM", "Room 1")).await.unwrap();
    clock.advance(Duration::minutes(5));
    let newer = ledger.create_booking(&request(3, 10, "2:00 PM", "Hall B")).await.unwrap();
    ledger.for_user(2).create_booking(&request(3, 1, "10:00 AM", "Room 1")).await.unwrap();

    let ids: Vec<_> = ledger
        .list_bookings_for_user()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn test_capacity_increase_confirms_waitlist() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 1));
    let slot_request = request(3, 10, "10:00 AM", "Room 1");

    let seated = ledger.create_booking(&slot_request).await.unwrap();
    clock.advance(Duration::minutes(1));
    let older = ledger.for_user(2).create_booking(&slot_request).await.unwrap();
    clock.advance(Duration::minutes(1));
    let newer = ledger.for_user(3).create_booking(&slot_request).await.unwrap();
    assert_eq!(older.status, BookingStatus::Pending);
    assert_eq!(newer.status, BookingStatus::Pending);

    // Same capacity again: nothing moves
    ledger.insert_teacher(math_teacher(3, 1));
    assert_eq!(ledger.booking(older.id).unwrap().status, BookingStatus::Pending);

    // One extra seat goes to the oldest waitlisted booking
    ledger.insert_teacher(math_teacher(3, 2));
    assert_eq!(ledger.booking(seated.id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(ledger.booking(older.id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(ledger.booking(newer.id).unwrap().status, BookingStatus::Pending);

    ledger.insert_teacher(math_teacher(3, 5));
    assert_eq!(ledger.booking(newer.id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(ledger.list_bookings_for_slot(&seated.slot()).await.unwrap().len(), 3);
}
