use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use shared::AppResult;
use shared::models::{Booking, BookingId, BookingStatus};

use super::store::AlertStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Modified,
    Cancelled,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::Modified, AlertKind::Cancelled];

    /// Persisted key holding the acknowledged ids
    pub fn store_key(&self) -> &'static str {
        match self {
            Self::Modified => "closedModifiedAlerts",
            Self::Cancelled => "closedCancelledAlerts",
        }
    }

    fn status(&self) -> BookingStatus {
        match self {
            Self::Modified => BookingStatus::Modified,
            Self::Cancelled => BookingStatus::Cancelled,
        }
    }
}

/// Which banners are visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertBanners {
    pub modified: bool,
    pub cancelled: bool,
}

impl AlertBanners {
    pub fn get(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::Modified => self.modified,
            AlertKind::Cancelled => self.cancelled,
        }
    }

    fn set(&mut self, kind: AlertKind, visible: bool) {
        match kind {
            AlertKind::Modified => self.modified = visible,
            AlertKind::Cancelled => self.cancelled = visible,
        }
    }
}

/// Decides banner visibility from the latest booking list
///
/// A banner shows when its category has at least one id the learner has not
/// acknowledged. Dismissing stores the category's current ids, replacing
/// whatever was stored before, so an id that leaves and re-enters the
/// category is announced again.
pub struct AlertDedupTracker {
    store: Arc<dyn AlertStore>,
    modified: BTreeSet<BookingId>,
    cancelled: BTreeSet<BookingId>,
    banners: AlertBanners,
}

impl AlertDedupTracker {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self {
            store,
            modified: BTreeSet::new(),
            cancelled: BTreeSet::new(),
            banners: AlertBanners::default(),
        }
    }

    pub fn banners(&self) -> AlertBanners {
        self.banners
    }

    pub fn ids(&self, kind: AlertKind) -> &BTreeSet<BookingId> {
        match kind {
            AlertKind::Modified => &self.modified,
            AlertKind::Cancelled => &self.cancelled,
        }
    }

    /// Recompute both banners; returns the new visibility
    ///
    /// An unreadable store counts as nothing acknowledged.
    pub fn refresh(&mut self, bookings: &[Booking]) -> AlertBanners {
        for kind in AlertKind::ALL {
            let ids: BTreeSet<BookingId> = bookings
                .iter()
                .filter(|b| b.status == kind.status())
                .map(|b| b.id)
                .collect();

            let acknowledged: BTreeSet<BookingId> = match self.store.load(kind.store_key()) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(key = kind.store_key(), error = %e, "Alert store read failed");
                    BTreeSet::new()
                }
            };

            let visible = !ids.is_empty() && ids.iter().any(|id| !acknowledged.contains(id));
            self.banners.set(kind, visible);
            match kind {
                AlertKind::Modified => self.modified = ids,
                AlertKind::Cancelled => self.cancelled = ids,
            }
        }
        self.banners
    }

    /// Hide the banner and acknowledge every id currently in its category
    pub fn dismiss(&mut self, kind: AlertKind) -> AppResult<()> {
        self.banners.set(kind, false);
        let ids: Vec<BookingId> = self.ids(kind).iter().copied().collect();
        self.store.save(kind.store_key(), &ids)?;
        tracing::debug!(key = kind.store_key(), ids = ?ids, "Alert dismissed");
        Ok(())
    }

    /// Show a banner regardless of acknowledgements (e.g. right after the
    /// learner cancelled a booking themselves)
    pub fn force_show(&mut self, kind: AlertKind) {
        self.banners.set(kind, true);
    }
}
