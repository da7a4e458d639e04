use crate::models::ContactMessage;
use sqlx::PgPool;

pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: &ContactMessage) -> Result<ContactMessage, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            "INSERT INTO contact_messages (name, email, message, created_at, is_processed)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *"
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(message.created_at)
        .bind(message.is_processed)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self, processed: Option<bool>) -> Result<Vec<ContactMessage>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            "SELECT * FROM contact_messages
             WHERE ($1::BOOLEAN IS NULL OR is_processed = $1)
             ORDER BY created_at DESC"
        )
        .bind(processed)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn set_processed(&self, ids: &[i32], processed: bool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE contact_messages SET is_processed = $1 WHERE id = ANY($2)")
            .bind(processed)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
