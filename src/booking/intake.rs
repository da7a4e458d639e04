use super::availability;
use super::datetime::{format_local, parse_datetime};
use crate::models::{Booking, BookingStatus, NewBooking, Zone};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Deserialize;

/// Raw reservation form as posted by the booking page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub zone: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub number_of_people: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl BookingForm {
    /// Zone id if the field is present and numeric
    pub fn zone_id(&self) -> Option<i32> {
        self.zone.as_deref().and_then(|z| z.trim().parse().ok())
    }
}

/// Why a reservation request was turned down; `Display` is the visitor-facing text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingRejection {
    #[error("Please fill in all fields of the form.")]
    MissingFields,

    #[error("Number of people must be a whole number.")]
    InvalidHeadcount,

    #[error("Number of people must be at least 1.")]
    TooFewPeople,

    #[error("Selected zone was not found.")]
    ZoneNotFound,

    #[error("{people} people selected, but the maximum capacity of zone \"{zone}\" is {capacity} people.")]
    ExceedsCapacity { people: i32, zone: String, capacity: i32 },

    #[error("Invalid date and time format.")]
    InvalidDateTime,

    #[error("Start time cannot be in the past.")]
    StartInPast,

    #[error("End time must be later than start time.")]
    EndNotAfterStart,

    #[error("Minimum booking duration is 1 hour.")]
    TooShort,

    #[error("Not enough free seats in zone \"{zone}\" at {start} for {people} people.")]
    NotEnoughSeats {
        zone: String,
        start: String,
        people: i32,
        available: i32,
    },
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Order and minimum length rules shared by intake and staff rescheduling
pub fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), BookingRejection> {
    if end <= start {
        return Err(BookingRejection::EndNotAfterStart);
    }
    if end - start < Duration::hours(1) {
        return Err(BookingRejection::TooShort);
    }
    Ok(())
}

/// Inputs that come from outside the form itself
pub struct IntakeContext<'a> {
    /// Zone looked up from the form's zone id, if any
    pub zone: Option<&'a Zone>,
    /// Bookings of that zone that may overlap the requested window
    pub existing: &'a [Booking],
    /// Authenticated submitter
    pub user_id: Option<i32>,
    pub now: DateTime<Utc>,
    pub venue_offset: FixedOffset,
}

/// Run the booking rules in order; the first failing rule decides the rejection.
pub fn validate(form: &BookingForm, ctx: &IntakeContext<'_>) -> Result<NewBooking, BookingRejection> {
    let (Some(_), Some(name), Some(phone), Some(email), Some(start_raw), Some(end_raw)) = (
        present(&form.zone),
        present(&form.name),
        present(&form.phone),
        present(&form.email),
        present(&form.start_time),
        present(&form.end_time),
    ) else {
        return Err(BookingRejection::MissingFields);
    };

    let people = match present(&form.number_of_people) {
        None => 1,
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| BookingRejection::InvalidHeadcount)?,
    };
    if people < 1 {
        return Err(BookingRejection::TooFewPeople);
    }

    let zone = ctx
        .zone
        .filter(|z| Some(z.id) == form.zone_id())
        .ok_or(BookingRejection::ZoneNotFound)?;

    if people > zone.capacity {
        return Err(BookingRejection::ExceedsCapacity {
            people,
            zone: zone.title.clone(),
            capacity: zone.capacity,
        });
    }

    let (Some(start), Some(end)) = (
        parse_datetime(start_raw, ctx.venue_offset),
        parse_datetime(end_raw, ctx.venue_offset),
    ) else {
        return Err(BookingRejection::InvalidDateTime);
    };

    if start < ctx.now {
        return Err(BookingRejection::StartInPast);
    }

    check_window(start, end)?;

    let available = availability::available_for_interval(zone, ctx.existing, start, end, None);
    if available < people {
        return Err(BookingRejection::NotEnoughSeats {
            zone: zone.title.clone(),
            start: format_local(start, ctx.venue_offset),
            people,
            available,
        });
    }

    Ok(NewBooking {
        user_id: ctx.user_id,
        zone_id: zone.id,
        customer_name: name.to_string(),
        customer_phone: phone.to_string(),
        customer_email: email.to_string(),
        number_of_people: people,
        start_time: start,
        end_time: end,
        status: BookingStatus::Confirmed,
    })
}
