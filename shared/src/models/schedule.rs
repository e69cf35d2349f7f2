//! Teacher availability (date → time label → place)

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::slot::SlotKey;
use super::TeacherId;
use crate::util::parse_time_label;

/// Raw availability of a teacher as published by the ledger
///
/// Serialized as `{"2024-01-01": {"10:00 AM": "Room 1"}}`. Dates are kept
/// sorted; time labels are kept as the teacher entered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<NaiveDate, BTreeMap<String, String>>);

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures
    pub fn with_entry(
        mut self,
        date: NaiveDate,
        time: impl Into<String>,
        place: impl Into<String>,
    ) -> Self {
        self.insert(date, time, place);
        self
    }

    pub fn insert(&mut self, date: NaiveDate, time: impl Into<String>, place: impl Into<String>) {
        self.0
            .entry(date)
            .or_default()
            .insert(time.into(), place.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    /// Dates on or after the calendar date of `now` in `tz`, ascending
    pub fn available_dates<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<NaiveDate> {
        let today = now.with_timezone(tz).date_naive();
        self.0
            .iter()
            .filter(|(date, times)| **date >= today && !times.is_empty())
            .map(|(date, _)| *date)
            .collect()
    }

    /// Time labels offered on `date`
    ///
    /// Ordered by time of day; labels that do not parse come last in
    /// lexical order. Unknown dates yield an empty list.
    pub fn available_times(&self, date: NaiveDate) -> Vec<&str> {
        let Some(times) = self.0.get(&date) else {
            return Vec::new();
        };
        let mut labels: Vec<&str> = times.keys().map(String::as_str).collect();
        labels.sort_by_key(|label| (parse_time_label(label).is_none(), parse_time_label(label)));
        labels
    }

    /// Place of the (date, time) entry, `None` when not available
    pub fn place_for(&self, date: NaiveDate, time: &str) -> Option<&str> {
        self.0
            .get(&date)
            .and_then(|times| times.get(time))
            .map(String::as_str)
    }

    /// Whether the schedule offers exactly this date, time and place
    pub fn offers(&self, date: NaiveDate, time: &str, place: &str) -> bool {
        self.place_for(date, time) == Some(place)
    }

    pub fn contains(&self, slot: &SlotKey) -> bool {
        self.offers(slot.date, &slot.time, &slot.place)
    }

    /// Every bookable slot of the schedule, in date then time order
    pub fn slots(&self, teacher_id: TeacherId) -> Vec<SlotKey> {
        self.0
            .keys()
            .flat_map(|date| {
                self.available_times(*date)
                    .into_iter()
                    .filter_map(move |time| {
                        self.place_for(*date, time)
                            .map(|place| SlotKey::new(teacher_id, *date, time, place))
                    })
            })
            .collect()
    }
}
