use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use parking_lot::Mutex;
use shared::ledger::BookingLedger;
use shared::models::{Booking, BookingAction, BookingId, RatingValue, TeacherId};
use shared::{AppError, AppResult, ErrorCode};
use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use super::scheduler::{PromptState, RatingPromptScheduler, Resolution};
use super::state::SessionState;
use crate::core::{BackgroundTasks, Clock, EngineConfig, InFlight, TaskKind};
use crate::events::SessionEvent;
use crate::utils::time::until;

#[derive(Debug, Clone, Copy)]
pub struct PromptConfig {
    pub timezone: Tz,
    /// Session start to prompt
    pub delay: Duration,
    pub poll_interval: std::time::Duration,
}

impl PromptConfig {
    fn poll(&self) -> Duration {
        Duration::from_std(self.poll_interval).unwrap_or_else(|_| Duration::seconds(60))
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Africa::Cairo,
            delay: Duration::hours(2),
            poll_interval: std::time::Duration::from_secs(60),
        }
    }
}

impl From<&EngineConfig> for PromptConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timezone: config.timezone,
            delay: config.rating_prompt_delay,
            poll_interval: config.prompt_poll_interval,
        }
    }
}

/// A ledger call that failed after the prompt was already closed
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: AppError,
}

/// Result of submitting or dismissing a prompt
///
/// The prompt is closed locally whatever the ledger said; `failures` lists
/// the calls that did not reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOutcome {
    pub booking: Booking,
    pub resolution: Resolution,
    pub failures: Vec<StepFailure>,
}

impl PromptOutcome {
    pub fn is_synced(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Inner {
    scheduler: Mutex<RatingPromptScheduler>,
    ledger: Arc<dyn BookingLedger>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SessionEvent>,
    wake: Notify,
    poll: Duration,
    resolving: InFlight,
}

/// Async driver of the rating prompt state machine
///
/// One reconciliation loop sleeps until the earlier of the next prompt
/// deadline and the next poll, or until woken by a booking change. The
/// scheduler lock is never held across an `.await`.
#[derive(Clone)]
pub struct PromptService {
    inner: Arc<Inner>,
}

impl PromptService {
    pub fn new(
        ledger: Arc<dyn BookingLedger>,
        clock: Arc<dyn Clock>,
        config: PromptConfig,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let scheduler =
            RatingPromptScheduler::new(config.timezone, config.delay, SessionState::new());
        Self {
            inner: Arc::new(Inner {
                scheduler: Mutex::new(scheduler),
                ledger,
                clock,
                events,
                wake: Notify::new(),
                poll: config.poll(),
                resolving: InFlight::new(),
            }),
        }
    }

    /// Load the learner's already-rated teachers from the ledger
    pub async fn seed_rated_teachers(&self) -> AppResult<usize> {
        let rated = self.inner.ledger.list_rated_teachers().await?;
        let count = rated.len();
        self.inner
            .scheduler
            .lock()
            .session_mut()
            .extend_rated_teachers(rated);
        tracing::debug!(count, "Seeded rated teachers");
        Ok(count)
    }

    /// Re-fetch the learner's bookings and re-evaluate prompts
    ///
    /// On failure the previously loaded list is kept.
    pub async fn refresh(&self) -> AppResult<Vec<Booking>> {
        let bookings = self
            .inner
            .ledger
            .list_bookings_for_user()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Booking refresh failed, keeping stale list"))?;
        self.load_bookings(bookings.clone());
        self.publish(SessionEvent::BookingsChanged {
            bookings: bookings.clone(),
        });
        Ok(bookings)
    }

    /// Replace the loaded booking list
    pub fn load_bookings(&self, bookings: Vec<Booking>) {
        let now = self.inner.clock.now();
        let shown = self.inner.scheduler.lock().load_bookings(bookings, now);
        self.announce(shown);
        self.nudge();
    }

    /// Start tracking a booking that was just created
    pub fn track(&self, booking: Booking) {
        let now = self.inner.clock.now();
        let shown = self.inner.scheduler.lock().schedule(booking, now);
        self.announce(shown);
        self.nudge();
    }

    /// One poll pass; returns the prompt it showed, if any
    pub fn reconcile(&self) -> Option<Booking> {
        let now = self.inner.clock.now();
        let shown = self.inner.scheduler.lock().poll(now);
        self.announce(shown.clone());
        shown
    }

    pub fn shown(&self) -> Option<Booking> {
        self.inner.scheduler.lock().shown().cloned()
    }

    pub fn state(&self, booking_id: BookingId) -> Option<PromptState> {
        self.inner.scheduler.lock().state(booking_id)
    }

    pub fn has_rated(&self, teacher_id: TeacherId) -> bool {
        self.inner.scheduler.lock().session().has_rated(teacher_id)
    }

    /// Wake the loop early
    pub fn nudge(&self) {
        self.inner.wake.notify_one();
    }

    /// Rate the teacher of the shown prompt
    ///
    /// Ratings outside 1..=5 are refused before anything is sent and the
    /// prompt stays open.
    pub async fn submit(&self, rating: u8) -> AppResult<PromptOutcome> {
        let rating = RatingValue::new(rating)?;
        let _guard = self.inner.resolving.try_begin("submit_rating")?;
        let booking = self.current()?;
        let ledger = &self.inner.ledger;
        let mut failures = Vec::new();

        let submitted = ledger.submit_rating(booking.teacher_id(), rating).await;
        note(&mut failures, "submit_rating", booking.id, submitted.map(drop));

        let resolved = self.close(Resolution::Submitted)?;

        let marked = ledger
            .update_booking_status(booking.id, BookingAction::MarkRated)
            .await;
        note(&mut failures, "mark_rated", booking.id, marked.map(drop));

        let recorded = ledger.record_rated_teacher(booking.teacher_id()).await;
        note(&mut failures, "record_rated_teacher", booking.id, recorded);

        Ok(self.finish(resolved, Resolution::Submitted, failures).await)
    }

    /// Close the shown prompt without rating
    pub async fn dismiss(&self) -> AppResult<PromptOutcome> {
        let _guard = self.inner.resolving.try_begin("dismiss_prompt")?;
        let booking = self.current()?;
        let ledger = &self.inner.ledger;
        let mut failures = Vec::new();

        let resolved = self.close(Resolution::Dismissed)?;

        let closed = ledger
            .update_booking_status(booking.id, BookingAction::ClosePopup)
            .await;
        note(&mut failures, "close_popup", booking.id, closed.map(drop));

        let recorded = ledger.record_rated_teacher(booking.teacher_id()).await;
        note(&mut failures, "record_rated_teacher", booking.id, recorded);

        Ok(self.finish(resolved, Resolution::Dismissed, failures).await)
    }

    /// Register the reconciliation loop with the session's tasks
    pub fn spawn(&self, tasks: &mut BackgroundTasks) {
        let service = self.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("rating_prompt_loop", TaskKind::Worker, async move {
            service.run(shutdown).await;
        });
    }

    /// Reconciliation loop
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("Rating prompt service started");
        loop {
            self.reconcile();

            let now = self.inner.clock.now();
            let wake_at = self.inner.scheduler.lock().next_wake(now, self.inner.poll);
            let sleep_for = until(wake_at, now);

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Rating prompt service received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(sleep_for) => {}
                _ = self.inner.wake.notified() => {}
            }
        }
        tracing::info!("Rating prompt service stopped");
    }

    fn current(&self) -> AppResult<Booking> {
        self.shown()
            .ok_or_else(|| AppError::new(ErrorCode::NoActivePrompt))
    }

    fn close(&self, resolution: Resolution) -> AppResult<Booking> {
        let now = self.inner.clock.now();
        self.inner.scheduler.lock().resolve(resolution, now)
    }

    async fn finish(
        &self,
        booking: Booking,
        resolution: Resolution,
        mut failures: Vec<StepFailure>,
    ) -> PromptOutcome {
        let refreshed = self.refresh().await;
        note(&mut failures, "refresh", booking.id, refreshed.map(drop));

        self.publish(SessionEvent::PromptResolved {
            booking_id: booking.id,
            teacher_id: booking.teacher_id(),
            resolution,
            synced: failures.is_empty(),
        });
        self.nudge();

        PromptOutcome {
            booking,
            resolution,
            failures,
        }
    }

    fn announce(&self, shown: Option<Booking>) {
        if let Some(booking) = shown {
            self.publish(SessionEvent::PromptShown { booking });
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

fn note(
    failures: &mut Vec<StepFailure>,
    step: &'static str,
    booking_id: BookingId,
    result: AppResult<()>,
) {
    if let Err(error) = result {
        tracing::warn!(booking_id, step, error = %error, "Ledger call failed, prompt closed anyway");
        failures.push(StepFailure { step, error });
    }
}
