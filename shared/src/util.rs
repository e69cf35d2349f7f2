use chrono::NaiveTime;

/// Accepted session time-label formats, tried in order
///
/// `"2:30 PM"`, `"14:30"`, `"14:30:00"`
pub const TIME_LABEL_FORMATS: [&str; 3] = ["%I:%M %p", "%H:%M", "%H:%M:%S"];

/// Parse a schedule time label into a time of day
///
/// Returns `None` when the label matches none of [`TIME_LABEL_FORMATS`].
pub fn parse_time_label(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    TIME_LABEL_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(label, fmt).ok())
}
