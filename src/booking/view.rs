use super::datetime::format_local;
use crate::models::{Booking, BookingStatus, Zone};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// A booking as shown on the profile, history and staff pages
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: i32,
    pub zone_id: i32,
    pub zone_title: Option<String>,
    pub user_id: Option<i32>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub number_of_people: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_local: String,
    pub end_local: String,
    pub status: BookingStatus,
    pub duration_hours: f64,
    pub total_price: Option<i64>,
    pub is_active_now: bool,
    pub created_at: DateTime<Utc>,
}

impl BookingView {
    pub fn new(booking: &Booking, zone: Option<&Zone>, now: DateTime<Utc>, venue_offset: FixedOffset) -> Self {
        Self {
            id: booking.id,
            zone_id: booking.zone_id,
            zone_title: zone.map(|z| z.title.clone()),
            user_id: booking.user_id,
            customer_name: booking.customer_name.clone(),
            customer_phone: booking.customer_phone.clone(),
            customer_email: booking.customer_email.clone(),
            number_of_people: booking.number_of_people,
            start_time: booking.start_time,
            end_time: booking.end_time,
            start_local: format_local(booking.start_time, venue_offset),
            end_local: format_local(booking.end_time, venue_offset),
            status: booking.status,
            duration_hours: booking.duration_hours(),
            total_price: zone.map(|z| booking.total_price(z.price_per_hour)),
            is_active_now: booking.is_active_at(now),
            created_at: booking.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_view_derives_price_and_activity() {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap();
        let booking = Booking {
            id: 5,
            user_id: Some(2),
            zone_id: 1,
            customer_name: "Petr".to_string(),
            customer_phone: "+70001112233".to_string(),
            customer_email: "petr@example.com".to_string(),
            number_of_people: 3,
            start_time: start,
            end_time: start + Duration::hours(2),
            status: BookingStatus::Confirmed,
            created_at: start - Duration::days(2),
        };
        let zone = Zone {
            id: 1,
            title: "Quiet room".to_string(),
            description: String::new(),
            price_per_hour: 250,
            capacity: 6,
        };
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();

        let view = BookingView::new(&booking, Some(&zone), start + Duration::minutes(30), offset);
        assert_eq!(view.total_price, Some(500));
        assert_eq!(view.duration_hours, 2.0);
        assert!(view.is_active_now);
        assert_eq!(view.start_local, "20.10.2026 13:00");
        assert_eq!(view.zone_title.as_deref(), Some("Quiet room"));

        let view = BookingView::new(&booking, None, start - Duration::hours(1), offset);
        assert_eq!(view.total_price, None);
        assert!(!view.is_active_now);
    }
}
