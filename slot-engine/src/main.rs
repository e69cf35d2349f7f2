use std::sync::Arc;

use anyhow::Context;
use slot_engine::{BookingSession, EngineConfig, SessionEvent, init_logger_with_file};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        ledger = %config.ledger_base_url,
        timezone = %config.timezone,
        "Slot engine starting"
    );

    // 2. Ledger client and session
    let ledger = config
        .client_config()
        .build_ledger()
        .context("failed to build ledger client")?;
    let mut session = BookingSession::from_config(&config, Arc::new(ledger));

    // 3. Capacity report for the configured teachers
    for &teacher_id in &config.teacher_ids {
        match session.teacher_availability(teacher_id).await {
            Ok((teacher, statuses)) => {
                for (slot, status) in &statuses {
                    tracing::info!(
                        teacher = %teacher.name,
                        slot = %slot,
                        occupancy = status.occupancy,
                        capacity = status.capacity,
                        full = status.is_full,
                        warning = status.warning.as_deref().unwrap_or(""),
                        "Slot status"
                    );
                }
            }
            Err(e) => tracing::warn!(teacher_id, error = %e, "Teacher unavailable"),
        }
    }

    // 4. Background work
    let mut events = session.subscribe();
    session.start().await;
    if !config.booking_refresh_interval.is_zero() {
        session.start_periodic_refresh(config.booking_refresh_interval);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.shutdown().await;
    tracing::info!("Slot engine stopped");
    Ok(())
}

fn log_event(event: &SessionEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(target: "events", "{}", json),
        Err(e) => tracing::warn!(error = %e, "Unserializable session event"),
    }
}
