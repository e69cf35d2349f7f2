mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{CAIRO, cairo, date, ledger_at_nine, math_teacher, request};
use shared::ErrorCode;
use shared::ledger::BookingLedger;
use shared::models::BookingStatus;
use slot_engine::alerts::MemoryAlertStore;
use slot_engine::rating::PromptState;
use slot_engine::{
    AlertKind, AlertStore, BookingSession, InMemoryLedger, JsonFileAlertStore, ManualClock,
    PromptConfig, SessionEvent,
};

fn session_over(
    ledger: &InMemoryLedger,
    clock: Arc<ManualClock>,
    store: Arc<dyn AlertStore>,
) -> BookingSession {
    let config = PromptConfig {
        timezone: CAIRO,
        delay: Duration::hours(2),
        poll_interval: StdDuration::from_secs(60),
    };
    BookingSession::new(Arc::new(ledger.clone()), store, clock, config)
}

#[tokio::test]
async fn test_create_booking_arms_prompt() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 1));
    let session = session_over(&ledger, clock, Arc::new(MemoryAlertStore::new()));

    let booking = session
        .create_booking(request(3, 1, "10:00 AM", "Room 1"))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(
        session.prompts().state(booking.id),
        Some(PromptState::Scheduled {
            due_at: cairo(2024, 1, 1, 12, 0)
        })
    );
    assert_eq!(session.bookings().len(), 1);

    let err = session
        .create_booking(request(3, 1, "10:00 AM", "Hall B"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PlaceMismatch);
}

#[tokio::test]
async fn test_availability_from_today() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 1));
    let session = session_over(&ledger, clock.clone(), Arc::new(MemoryAlertStore::new()));

    let (teacher, statuses) = session.teacher_availability(3).await.unwrap();
    assert_eq!(session.available_dates(&teacher), vec![date(2024, 1, 1), date(2024, 1, 10)]);
    assert_eq!(statuses.len(), 3);

    clock.set(cairo(2024, 1, 2, 0, 30));
    assert_eq!(session.available_dates(&teacher), vec![date(2024, 1, 10)]);
}

#[tokio::test]
async fn test_modified_banner_dedup() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let session = session_over(&ledger, clock, Arc::new(MemoryAlertStore::new()));

    let first = session
        .create_booking(request(3, 10, "10:00 AM", "Room 1"))
        .await
        .unwrap();
    let second = session
        .create_booking(request(3, 10, "2:00 PM", "Hall B"))
        .await
        .unwrap();

    ledger.set_status(first.id, BookingStatus::Modified).unwrap();
    session.refresh().await.unwrap();
    assert!(session.banners().modified);

    session.dismiss_alert(AlertKind::Modified).unwrap();
    assert!(!session.banners().modified);
    session.refresh().await.unwrap();
    assert!(!session.banners().modified);

    ledger.set_status(second.id, BookingStatus::Modified).unwrap();
    session.refresh().await.unwrap();
    assert!(session.banners().modified);
}

#[tokio::test]
async fn test_cancel_shows_cancelled_banner() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let session = session_over(&ledger, clock, Arc::new(MemoryAlertStore::new()));
    let booking = session
        .create_booking(request(3, 10, "10:00 AM", "Room 1"))
        .await
        .unwrap();

    let cancelled = session.cancel_booking(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(session.banners().cancelled);

    session.dismiss_alert(AlertKind::Cancelled).unwrap();
    session.refresh().await.unwrap();
    assert!(!session.banners().cancelled);
}

#[tokio::test]
async fn test_late_cancel_leaves_banner_alone() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let session = session_over(&ledger, clock, Arc::new(MemoryAlertStore::new()));
    let booking = session
        .create_booking(request(3, 1, "10:00 AM", "Room 1"))
        .await
        .unwrap();

    let err = session.cancel_booking(booking.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CancellationWindowClosed);
    assert!(!session.banners().cancelled);
}

#[tokio::test]
async fn test_dismissed_alerts_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alerts.json");
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));

    let booking = ledger
        .create_booking(&request(3, 10, "10:00 AM", "Room 1"))
        .await
        .unwrap();
    ledger.set_status(booking.id, BookingStatus::Modified).unwrap();

    let session = session_over(&ledger, clock.clone(), Arc::new(JsonFileAlertStore::new(path.clone())));
    session.refresh().await.unwrap();
    assert!(session.banners().modified);
    session.dismiss_alert(AlertKind::Modified).unwrap();
    drop(session);

    let restarted = session_over(&ledger, clock, Arc::new(JsonFileAlertStore::new(path.clone())));
    restarted.refresh().await.unwrap();
    assert!(!restarted.banners().modified);
}

#[tokio::test]
async fn test_background_listener_publishes_banners() {
    let (ledger, clock) = ledger_at_nine();
    ledger.insert_teacher(math_teacher(3, 2));
    let booking = ledger
        .create_booking(&request(3, 10, "10:00 AM", "Room 1"))
        .await
        .unwrap();

    let mut session = session_over(&ledger, clock, Arc::new(MemoryAlertStore::new()));
    let mut events = session.subscribe();
    session.start().await;

    ledger.set_status(booking.id, BookingStatus::Cancelled).unwrap();
    // Goes through the prompt service only; the listener updates the banners
    session.prompts().refresh().await.unwrap();

    let banners = tokio::time::timeout(StdDuration::from_secs(5), async {
        loop {
            if let Ok(SessionEvent::AlertsChanged { banners }) = events.recv().await {
                break banners;
            }
        }
    })
    .await
    .expect("banners were not published");
    assert!(banners.cancelled);
    assert!(session.banners().cancelled);

    session.shutdown().await;
}
