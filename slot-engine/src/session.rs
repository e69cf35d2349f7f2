//! Learner booking session
//!
//! [`BookingSession`] wires the ledger, capacity resolver, rating prompts and
//! alert banners together for one learner, and owns every background task
//! they need. Dropping the session (or calling [`BookingSession::shutdown`])
//! stops the tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use parking_lot::Mutex;
use shared::ledger::BookingLedger;
use shared::models::{Booking, BookingAction, BookingId, NewBooking, Teacher, TeacherId};
use shared::AppResult;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::alerts::{AlertBanners, AlertDedupTracker, AlertKind, AlertStore, JsonFileAlertStore};
use crate::capacity::{SlotCapacityResolver, SlotStatusMap};
use crate::core::{BackgroundTasks, Clock, EngineConfig, InFlight, SystemClock, TaskKind};
use crate::events::{self, SessionEvent};
use crate::rating::{PromptConfig, PromptOutcome, PromptService};

/// State the listener task and the session both touch
struct Shared {
    alerts: Mutex<AlertDedupTracker>,
    bookings: Mutex<Vec<Booking>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn apply(&self, bookings: &[Booking]) {
        *self.bookings.lock() = bookings.to_vec();
        let (before, after) = {
            let mut alerts = self.alerts.lock();
            let before = alerts.banners();
            (before, alerts.refresh(bookings))
        };
        if before != after {
            self.publish_banners(after);
        }
    }

    fn publish_banners(&self, banners: AlertBanners) {
        let _ = self.events.send(SessionEvent::AlertsChanged { banners });
    }
}

pub struct BookingSession {
    ledger: Arc<dyn BookingLedger>,
    resolver: SlotCapacityResolver,
    prompts: PromptService,
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    booking_gesture: InFlight,
    cancel_gesture: InFlight,
    tasks: BackgroundTasks,
}

impl BookingSession {
    pub fn new(
        ledger: Arc<dyn BookingLedger>,
        alert_store: Arc<dyn AlertStore>,
        clock: Arc<dyn Clock>,
        config: PromptConfig,
    ) -> Self {
        let (events, _) = events::channel();
        let prompts = PromptService::new(ledger.clone(), clock.clone(), config, events.clone());
        Self {
            resolver: SlotCapacityResolver::new(ledger.clone()),
            ledger,
            prompts,
            shared: Arc::new(Shared {
                alerts: Mutex::new(AlertDedupTracker::new(alert_store)),
                bookings: Mutex::new(Vec::new()),
                events,
            }),
            clock,
            timezone: config.timezone,
            booking_gesture: InFlight::new(),
            cancel_gesture: InFlight::new(),
            tasks: BackgroundTasks::new(),
        }
    }

    /// Session over the configured alert file and the wall clock
    pub fn from_config(config: &EngineConfig, ledger: Arc<dyn BookingLedger>) -> Self {
        let store = Arc::new(JsonFileAlertStore::new(config.alert_store_file.clone()));
        Self::new(ledger, store, Arc::new(SystemClock), PromptConfig::from(config))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn prompts(&self) -> &PromptService {
        &self.prompts
    }

    pub fn resolver(&self) -> &SlotCapacityResolver {
        &self.resolver
    }

    /// Seed dedup state, load bookings and start the background tasks
    ///
    /// Ledger failures here are logged; the session still starts and catches
    /// up on the next refresh.
    pub async fn start(&mut self) {
        match self.prompts.seed_rated_teachers().await {
            Ok(count) => tracing::info!(count, "Rated teachers loaded"),
            Err(e) => tracing::warn!(error = %e, "Could not load rated teachers"),
        }
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Initial booking load failed");
        }

        self.prompts.spawn(&mut self.tasks);
        self.spawn_listener();
        tracing::info!(tasks = self.tasks.len(), "Booking session started");
    }

    /// Refresh the booking list every `every`
    pub fn start_periodic_refresh(&mut self, every: Duration) {
        let prompts = self.prompts.clone();
        let shutdown = self.tasks.shutdown_token();
        self.tasks.spawn("booking_refresh", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(every);
            // First tick completes immediately; the session already loaded once
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        // Failures are logged inside refresh
                        let _ = prompts.refresh().await;
                    }
                }
            }
        });
    }

    /// Fetch the learner's bookings; updates prompts and banners
    pub async fn refresh(&self) -> AppResult<Vec<Booking>> {
        let bookings = self.prompts.refresh().await?;
        self.shared.apply(&bookings);
        Ok(bookings)
    }

    /// Last successfully loaded booking list
    pub fn bookings(&self) -> Vec<Booking> {
        self.shared.bookings.lock().clone()
    }

    /// Bookable dates of `teacher` from today on, in the reference timezone
    pub fn available_dates(&self, teacher: &Teacher) -> Vec<NaiveDate> {
        teacher
            .schedule
            .available_dates(self.clock.now(), &self.timezone)
    }

    /// Teacher plus the status of every slot in its schedule
    pub async fn teacher_availability(
        &self,
        teacher_id: TeacherId,
    ) -> AppResult<(Teacher, SlotStatusMap)> {
        self.resolver.resolve_teacher(teacher_id).await
    }

    /// Book a slot; the ledger decides confirmed vs waitlisted
    pub async fn create_booking(&self, request: NewBooking) -> AppResult<Booking> {
        let _guard = self.booking_gesture.try_begin("create_booking")?;
        let booking = self
            .ledger
            .create_booking(&request)
            .await
            .inspect_err(|e| tracing::warn!(slot = %request.slot(), error = %e, "Booking rejected"))?;

        self.shared.bookings.lock().push(booking.clone());
        self.prompts.track(booking.clone());
        Ok(booking)
    }

    /// Cancel one of the learner's bookings and raise the cancelled banner
    pub async fn cancel_booking(&self, booking_id: BookingId) -> AppResult<Booking> {
        let _guard = self.cancel_gesture.try_begin("cancel_booking")?;
        let cancelled = self
            .ledger
            .update_booking_status(booking_id, BookingAction::Cancel)
            .await
            .inspect_err(|e| tracing::warn!(booking_id, error = %e, "Cancellation refused"))?;

        // Refresh failures are already logged and leave the stale list
        let _ = self.refresh().await;

        let banners = {
            let mut alerts = self.shared.alerts.lock();
            alerts.force_show(AlertKind::Cancelled);
            alerts.banners()
        };
        self.shared.publish_banners(banners);
        Ok(cancelled)
    }

    pub async fn submit_rating(&self, rating: u8) -> AppResult<PromptOutcome> {
        self.prompts.submit(rating).await
    }

    pub async fn dismiss_prompt(&self) -> AppResult<PromptOutcome> {
        self.prompts.dismiss().await
    }

    pub fn banners(&self) -> AlertBanners {
        self.shared.alerts.lock().banners()
    }

    pub fn dismiss_alert(&self, kind: AlertKind) -> AppResult<()> {
        let banners = {
            let mut alerts = self.shared.alerts.lock();
            alerts.dismiss(kind)?;
            alerts.banners()
        };
        self.shared.publish_banners(banners);
        Ok(())
    }

    /// Stop every background task and wait for them
    pub async fn shutdown(self) {
        self.tasks.shutdown().await;
    }

    fn spawn_listener(&mut self) {
        let shared = self.shared.clone();
        let mut rx = self.shared.events.subscribe();
        let shutdown = self.tasks.shutdown_token();
        self.tasks.spawn("booking_listener", TaskKind::Listener, async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(SessionEvent::BookingsChanged { bookings }) => shared.apply(&bookings),
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });
    }
}
