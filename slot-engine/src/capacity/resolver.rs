use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use shared::AppResult;
use shared::ledger::BookingLedger;
use shared::models::{Booking, SlotKey, SlotStatus, Teacher, TeacherId};

/// Slot statuses keyed by `date|time|place`
pub type SlotStatusMap = BTreeMap<String, SlotStatus>;

/// Computes per-slot occupancy from the ledger
#[derive(Clone)]
pub struct SlotCapacityResolver {
    ledger: Arc<dyn BookingLedger>,
}

impl SlotCapacityResolver {
    pub fn new(ledger: Arc<dyn BookingLedger>) -> Self {
        Self { ledger }
    }

    /// Non-cancelled bookings at `slot`
    pub async fn occupancy(&self, slot: &SlotKey) -> AppResult<u32> {
        let bookings = self.ledger.list_bookings_for_slot(slot).await?;
        Ok(count_occupying(&bookings))
    }

    /// Status of one slot
    ///
    /// A failed ledger query yields a zero-occupancy status carrying a
    /// warning instead of an error.
    pub async fn resolve_slot_status(&self, slot: &SlotKey, capacity: u32) -> SlotStatus {
        match self.occupancy(slot).await {
            Ok(occupancy) => SlotStatus::from_counts(occupancy, capacity),
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Slot occupancy query failed");
                SlotStatus::degraded(capacity, e.message)
            }
        }
    }

    /// Status of every slot in the teacher's schedule, queried concurrently
    pub async fn resolve_schedule(&self, teacher: &Teacher) -> SlotStatusMap {
        let capacity = teacher.capacity();
        let slots = teacher.slots();
        let statuses = join_all(
            slots
                .iter()
                .map(|slot| self.resolve_slot_status(slot, capacity)),
        )
        .await;

        let map: SlotStatusMap = slots
            .iter()
            .map(SlotKey::map_key)
            .zip(statuses)
            .collect();

        let degraded = map.values().filter(|s| s.is_degraded()).count();
        tracing::debug!(
            teacher_id = teacher.id,
            slots = map.len(),
            degraded,
            "Resolved schedule capacity"
        );
        map
    }

    /// Fetch the teacher, then resolve its schedule
    pub async fn resolve_teacher(&self, teacher_id: TeacherId) -> AppResult<(Teacher, SlotStatusMap)> {
        let teacher = self.ledger.get_teacher(teacher_id).await?;
        let statuses = self.resolve_schedule(&teacher).await;
        Ok((teacher, statuses))
    }
}

fn count_occupying(bookings: &[Booking]) -> u32 {
    let count = bookings.iter().filter(|b| b.status.occupies_slot()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
