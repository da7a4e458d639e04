use crate::models::{Booking, BookingStatus, NewBooking};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

/// Optional filters for the staff booking list
#[derive(Debug, Default, Clone, Copy)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub zone_id: Option<i32>,
    pub user_id: Option<i32>,
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id_in(&self, conn: &mut PgConnection, id: i32) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Pending and confirmed bookings (of every zone) running at `now`
    pub async fn list_active_at(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE status IN ('pending', 'confirmed') AND start_time <= $1 AND end_time >= $1"
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    /// Non-cancelled bookings of a zone that overlap `[start, end)`
    pub async fn list_overlapping(
        &self,
        zone_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE zone_id = $1 AND start_time < $3 AND end_time > $2 AND status <> 'cancelled'"
        )
        .bind(zone_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    /// Same as `list_overlapping`, inside a transaction
    pub async fn list_overlapping_in(
        &self,
        conn: &mut PgConnection,
        zone_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE zone_id = $1 AND start_time < $3 AND end_time > $2 AND status <> 'cancelled'"
        )
        .bind(zone_id)
        .bind(start)
        .bind(end)
        .fetch_all(conn)
        .await
    }

    /// Non-cancelled bookings of a zone still running after `after`.
    /// Any window starting at or after `after` can only overlap these.
    pub async fn list_upcoming_in(
        &self,
        conn: &mut PgConnection,
        zone_id: i32,
        after: DateTime<Utc>,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE zone_id = $1 AND end_time > $2 AND status <> 'cancelled'"
        )
        .bind(zone_id)
        .bind(after)
        .fetch_all(conn)
        .await
    }

    pub async fn create_in(&self, conn: &mut PgConnection, booking: &NewBooking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, zone_id, customer_name, customer_phone, customer_email,
                                   number_of_people, start_time, end_time, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
             RETURNING *"
        )
        .bind(booking.user_id)
        .bind(booking.zone_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_phone)
        .bind(&booking.customer_email)
        .bind(booking.number_of_people)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status.as_str())
        .fetch_one(conn)
        .await
    }

    /// A user's bookings, newest first
    pub async fn list_for_user(&self, user_id: i32, limit: Option<i64>) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_filtered(&self, filter: BookingFilter) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::INTEGER IS NULL OR zone_id = $2)
               AND ($3::INTEGER IS NULL OR user_id = $3)
             ORDER BY created_at DESC"
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.zone_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_status_in(
        &self,
        conn: &mut PgConnection,
        ids: &[i32],
        status: BookingStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = ANY($2)")
            .bind(status.as_str())
            .bind(ids)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_schedule_in(
        &self,
        conn: &mut PgConnection,
        id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET start_time = $2, end_time = $3 WHERE id = $1 RETURNING *"
        )
        .bind(id)
        .bind(start)
        .bind(end)
        .fetch_one(conn)
        .await
    }

    pub async fn count_by_zone(&self) -> Result<HashMap<i32, i64>, sqlx::Error> {
        let rows: Vec<(i32, i64)> = sqlx::query_as("SELECT zone_id, COUNT(*) FROM bookings GROUP BY zone_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn count_by_user(&self) -> Result<HashMap<i32, i64>, sqlx::Error> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT user_id, COUNT(*) FROM bookings WHERE user_id IS NOT NULL GROUP BY user_id"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
