use crate::models::Zone;
use sqlx::{PgConnection, PgPool};

pub struct ZoneRepository {
    pool: PgPool,
}

impl ZoneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>("SELECT * FROM zones ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>("SELECT * FROM zones WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Fetch a zone and hold its row lock until the surrounding transaction ends.
    /// Bookings for the same zone are checked and inserted one at a time.
    pub async fn lock_in(&self, conn: &mut PgConnection, id: i32) -> Result<Option<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>("SELECT * FROM zones WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn exists_with_title(&self, title: &str) -> Result<bool, sqlx::Error> {
        let result: Option<(bool,)> = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM zones WHERE title = $1)")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|(exists,)| exists).unwrap_or(false))
    }

    pub async fn create(&self, zone: &Zone) -> Result<Zone, sqlx::Error> {
        sqlx::query_as::<_, Zone>(
            "INSERT INTO zones (title, description, price_per_hour, capacity)
             VALUES ($1, $2, $3, $4)
             RETURNING *"
        )
        .bind(&zone.title)
        .bind(&zone.description)
        .bind(zone.price_per_hour)
        .bind(zone.capacity)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(&self, zone: &Zone) -> Result<Option<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>(
            "UPDATE zones
             SET title = $2, description = $3, price_per_hour = $4, capacity = $5
             WHERE id = $1
             RETURNING *"
        )
        .bind(zone.id)
        .bind(&zone.title)
        .bind(&zone.description)
        .bind(zone.price_per_hour)
        .bind(zone.capacity)
        .fetch_optional(&self.pool)
        .await
    }
}
