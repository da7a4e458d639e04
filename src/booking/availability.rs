use crate::models::{Booking, BookingStatus, Zone};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Current occupancy bucket of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    FullyBooked,
    PartiallyAvailable,
    FullyAvailable,
}

impl AvailabilityStatus {
    pub fn classify(available_seats: i32, capacity: i32) -> Self {
        if available_seats <= 0 {
            AvailabilityStatus::FullyBooked
        } else if available_seats < capacity {
            AvailabilityStatus::PartiallyAvailable
        } else {
            AvailabilityStatus::FullyAvailable
        }
    }
}

fn free_seats<'a>(zone: &Zone, occupying: impl Iterator<Item = &'a Booking>) -> i32 {
    let occupied: i64 = occupying.map(|b| i64::from(b.number_of_people)).sum();
    (i64::from(zone.capacity) - occupied).max(0) as i32
}

/// Free seats at the instant `now`.
///
/// Only pending and confirmed bookings whose interval contains `now`
/// (inclusive at both ends) take seats.
pub fn available_now(zone: &Zone, bookings: &[Booking], now: DateTime<Utc>) -> i32 {
    free_seats(
        zone,
        bookings
            .iter()
            .filter(|b| b.zone_id == zone.id && b.is_active_at(now)),
    )
}

/// Free seats over `[start, end)`.
///
/// Every booking that overlaps the window and is not cancelled takes seats.
/// `exclude` skips one booking, used when the booking itself is being moved.
pub fn available_for_interval(
    zone: &Zone,
    bookings: &[Booking],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<i32>,
) -> i32 {
    free_seats(
        zone,
        bookings.iter().filter(|b| {
            b.zone_id == zone.id
                && b.status != BookingStatus::Cancelled
                && Some(b.id) != exclude
                && b.overlaps(start, end)
        }),
    )
}

/// Whether `people` more visitors fit into the zone over `[start, end)`
pub fn fits(
    zone: &Zone,
    bookings: &[Booking],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    people: i32,
    exclude: Option<i32>,
) -> bool {
    available_for_interval(zone, bookings, start, end, exclude) >= people
}

/// Seat count and status bucket of a zone at one instant
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSnapshot {
    pub id: i32,
    pub title: String,
    pub capacity: i32,
    pub available_seats: i32,
    pub status: AvailabilityStatus,
    pub is_available: bool,
    pub updated_at: DateTime<Utc>,
}

impl ZoneSnapshot {
    pub fn take(zone: &Zone, bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let available_seats = available_now(zone, bookings, now);
        Self {
            id: zone.id,
            title: zone.title.clone(),
            capacity: zone.capacity,
            available_seats,
            status: AvailabilityStatus::classify(available_seats, zone.capacity),
            is_available: available_seats > 0,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn zone(capacity: i32) -> Zone {
        Zone {
            id: 7,
            title: "Console room".to_string(),
            description: String::new(),
            price_per_hour: 400,
            capacity,
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, minute, 0).unwrap()
    }

    fn booking(id: i32, people: i32, start: DateTime<Utc>, end: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id,
            user_id: None,
            zone_id: 7,
            customer_name: "Guest".to_string(),
            customer_phone: "+70000000000".to_string(),
            customer_email: "guest@example.com".to_string(),
            number_of_people: people,
            start_time: start,
            end_time: end,
            status,
            created_at: start - Duration::days(1),
        }
    }

    #[test]
    fn test_empty_zone_is_fully_available() {
        let z = zone(4);
        assert_eq!(available_now(&z, &[], at(10, 0)), 4);
        assert_eq!(available_for_interval(&z, &[], at(10, 0), at(12, 0), None), 4);
        assert!(fits(&z, &[], at(10, 0), at(12, 0), 4, None));
        assert!(!fits(&z, &[], at(10, 0), at(12, 0), 5, None));
    }

    #[test]
    fn test_overlapping_booking_reduces_seats() {
        let z = zone(4);
        let existing = vec![booking(1, 2, at(10, 0), at(12, 0), BookingStatus::Confirmed)];

        assert_eq!(available_for_interval(&z, &existing, at(11, 0), at(13, 0), None), 2);
        assert!(!fits(&z, &existing, at(11, 0), at(13, 0), 3, None));
        assert!(fits(&z, &existing, at(11, 0), at(13, 0), 2, None));
    }

    #[test]
    fn test_touching_interval_does_not_overlap() {
        let z = zone(4);
        let existing = vec![booking(1, 2, at(10, 0), at(12, 0), BookingStatus::Confirmed)];

        assert_eq!(available_for_interval(&z, &existing, at(12, 0), at(13, 0), None), 4);
        assert_eq!(available_for_interval(&z, &existing, at(9, 0), at(10, 0), None), 4);
    }

    #[test]
    fn test_window_after_all_bookings_has_full_capacity() {
        let z = zone(6);
        let existing = vec![
            booking(1, 3, at(9, 0), at(11, 0), BookingStatus::Confirmed),
            booking(2, 2, at(10, 0), at(14, 0), BookingStatus::Pending),
            booking(3, 1, at(13, 0), at(15, 30), BookingStatus::Completed),
        ];
        assert_eq!(available_for_interval(&z, &existing, at(16, 0), at(18, 0), None), 6);
    }

    #[test]
    fn test_interval_ignores_cancelled_but_counts_completed() {
        let z = zone(5);
        let existing = vec![
            booking(1, 2, at(10, 0), at(12, 0), BookingStatus::Cancelled),
            booking(2, 1, at(10, 0), at(12, 0), BookingStatus::Completed),
        ];
        assert_eq!(available_for_interval(&z, &existing, at(10, 30), at(11, 30), None), 4);
    }

    #[test]
    fn test_interval_excludes_given_booking() {
        let z = zone(4);
        let existing = vec![
            booking(1, 3, at(10, 0), at(12, 0), BookingStatus::Confirmed),
            booking(2, 1, at(10, 0), at(12, 0), BookingStatus::Confirmed),
        ];
        assert_eq!(available_for_interval(&z, &existing, at(10, 0), at(12, 0), None), 0);
        assert_eq!(available_for_interval(&z, &existing, at(10, 0), at(12, 0), Some(1)), 3);
        assert!(fits(&z, &existing, at(11, 0), at(13, 0), 3, Some(1)));
    }

    #[test]
    fn test_seats_clamp_at_zero() {
        let z = zone(2);
        let existing = vec![
            booking(1, 2, at(10, 0), at(12, 0), BookingStatus::Confirmed),
            booking(2, 2, at(10, 0), at(12, 0), BookingStatus::Confirmed),
        ];
        assert_eq!(available_for_interval(&z, &existing, at(10, 0), at(11, 0), None), 0);
        assert_eq!(available_now(&z, &existing, at(11, 0)), 0);
    }

    #[test]
    fn test_now_counts_only_pending_and_confirmed() {
        let z = zone(10);
        let existing = vec![
            booking(1, 2, at(10, 0), at(12, 0), BookingStatus::Confirmed),
            booking(2, 3, at(10, 0), at(12, 0), BookingStatus::Pending),
            booking(3, 4, at(10, 0), at(12, 0), BookingStatus::Completed),
            booking(4, 1, at(10, 0), at(12, 0), BookingStatus::Cancelled),
        ];
        assert_eq!(available_now(&z, &existing, at(11, 0)), 5);
        // bounds are inclusive
        assert_eq!(available_now(&z, &existing, at(12, 0)), 5);
        assert_eq!(available_now(&z, &existing, at(12, 1)), 10);
    }

    #[test]
    fn test_other_zones_are_ignored() {
        let z = zone(3);
        let mut foreign = booking(1, 3, at(10, 0), at(12, 0), BookingStatus::Confirmed);
        foreign.zone_id = 8;
        let existing = vec![foreign];
        assert_eq!(available_now(&z, &existing, at(11, 0)), 3);
        assert_eq!(available_for_interval(&z, &existing, at(10, 0), at(12, 0), None), 3);
    }

    #[test]
    fn test_classify() {
        assert_eq!(AvailabilityStatus::classify(0, 4), AvailabilityStatus::FullyBooked);
        assert_eq!(AvailabilityStatus::classify(3, 4), AvailabilityStatus::PartiallyAvailable);
        assert_eq!(AvailabilityStatus::classify(4, 4), AvailabilityStatus::FullyAvailable);
    }

    #[test]
    fn test_snapshot() {
        let z = zone(4);
        let existing = vec![booking(1, 4, at(10, 0), at(12, 0), BookingStatus::Confirmed)];
        let snapshot = ZoneSnapshot::take(&z, &existing, at(11, 0));
        assert_eq!(snapshot.available_seats, 0);
        assert_eq!(snapshot.status, AvailabilityStatus::FullyBooked);
        assert!(!snapshot.is_available);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "fully_booked");
        assert_eq!(json["capacity"], 4);
    }
}
