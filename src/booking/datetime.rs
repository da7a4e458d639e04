use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a submitted date-time.
///
/// Values carrying an offset keep it; naive values (what a `datetime-local`
/// input sends) are read as venue-local time.
pub fn parse_datetime(value: &str, venue_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // RFC 3339 with a space separator
    if value.len() > 10 && value.as_bytes()[10] == b' ' {
        let with_t = format!("{}T{}", &value[..10], &value[11..]);
        if let Ok(dt) = DateTime::parse_from_rfc3339(&with_t) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(|naive| venue_offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
}

/// `20.10.2026 14:00` in venue-local time
pub fn format_local(dt: DateTime<Utc>, venue_offset: FixedOffset) -> String {
    dt.with_timezone(&venue_offset).format("%d.%m.%Y %H:%M").to_string()
}

/// `14:00` in venue-local time
pub fn format_local_time(dt: DateTime<Utc>, venue_offset: FixedOffset) -> String {
    dt.with_timezone(&venue_offset).format("%H:%M").to_string()
}

/// Value for a `datetime-local` input, e.g. `2026-10-20T14:00`
pub fn format_input(dt: DateTime<Utc>, venue_offset: FixedOffset) -> String {
    dt.with_timezone(&venue_offset).format("%Y-%m-%dT%H:%M").to_string()
}
