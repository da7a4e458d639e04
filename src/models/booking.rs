use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Statuses that hold seats at the current moment
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i32,
    pub user_id: Option<i32>,
    pub zone_id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub number_of_people: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Duration in tenths of an hour, ties rounded to the even tenth
    pub fn duration_tenths(&self) -> i64 {
        let seconds = (self.end_time - self.start_time).num_seconds().max(0);
        let (tenths, rest) = ((seconds * 10) / 3600, (seconds * 10) % 3600);
        match (rest * 2).cmp(&3600) {
            std::cmp::Ordering::Greater => tenths + 1,
            std::cmp::Ordering::Equal if tenths % 2 == 1 => tenths + 1,
            _ => tenths,
        }
    }

    /// Duration in hours rounded to one decimal place
    pub fn duration_hours(&self) -> f64 {
        self.duration_tenths() as f64 / 10.0
    }

    /// Price of the whole booking at the given hourly rate
    pub fn total_price(&self, price_per_hour: i32) -> i64 {
        self.duration_tenths() * i64::from(price_per_hour) / 10
    }

    /// Whether the interval covers `now` (bounds inclusive) with a seat-holding status
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.start_time <= now && now <= self.end_time
    }

    /// Whether the booking shares any instant with `[start, end)`; touching endpoints don't count
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// A validated booking ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Option<i32>,
    pub zone_id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub number_of_people: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn booking(start_hour: u32, minutes: i64, status: BookingStatus) -> Booking {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, start_hour, 0, 0).unwrap();
        Booking {
            id: 1,
            user_id: None,
            zone_id: 1,
            customer_name: "Anna".to_string(),
            customer_phone: "+70000000000".to_string(),
            customer_email: "anna@example.com".to_string(),
            number_of_people: 2,
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            status,
            created_at: start - Duration::days(1),
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<BookingStatus>().is_err());
        assert!(BookingStatus::try_from("Confirmed".to_string()).is_err());
    }

    #[test]
    fn test_duration_and_price() {
        let b = booking(10, 90, BookingStatus::Confirmed);
        assert_eq!(b.duration_tenths(), 15);
        assert_eq!(b.duration_hours(), 1.5);
        assert_eq!(b.total_price(500), 750);

        // 100 minutes = 1.666.. hours -> 1.7
        let b = booking(10, 100, BookingStatus::Confirmed);
        assert_eq!(b.duration_tenths(), 17);
        assert_eq!(b.total_price(300), 510);
    }

    #[test]
    fn test_quarter_hour_ties_round_to_even_tenth() {
        let cases = [(75, 12, 360), (105, 18, 540), (135, 22, 660), (165, 28, 840)];
        for (minutes, tenths, price) in cases {
            let b = booking(10, minutes, BookingStatus::Confirmed);
            assert_eq!(b.duration_tenths(), tenths, "{} minutes", minutes);
            assert_eq!(b.total_price(300), price, "{} minutes", minutes);
        }
    }

    #[test]
    fn test_is_active_at_is_inclusive() {
        let b = booking(10, 120, BookingStatus::Confirmed);
        assert!(b.is_active_at(b.start_time));
        assert!(b.is_active_at(b.end_time));
        assert!(!b.is_active_at(b.end_time + Duration::seconds(1)));

        let cancelled = booking(10, 120, BookingStatus::Cancelled);
        assert!(!cancelled.is_active_at(cancelled.start_time + Duration::minutes(5)));
        let completed = booking(10, 120, BookingStatus::Completed);
        assert!(!completed.is_active_at(completed.start_time + Duration::minutes(5)));
    }

    #[test]
    fn test_overlap_excludes_touching_intervals() {
        let b = booking(10, 120, BookingStatus::Confirmed);
        let noon = b.end_time;
        assert!(!b.overlaps(noon, noon + Duration::hours(1)));
        assert!(!b.overlaps(b.start_time - Duration::hours(1), b.start_time));
        assert!(b.overlaps(noon - Duration::minutes(1), noon + Duration::hours(1)));
    }
}
