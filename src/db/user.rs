use crate::models::User;
use sqlx::PgPool;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Look a user up by username, falling back to a case-insensitive email match
    pub async fn get_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        if let Some(user) = self.get_by_username(login).await? {
            return Ok(Some(user));
        }
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) ORDER BY id LIMIT 1"
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        let result: Option<(bool,)> = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|(exists,)| exists).unwrap_or(false))
    }

    pub async fn create(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, first_name, last_name, phone, date_of_birth,
                                password_hash, is_staff, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *"
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.date_of_birth)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_phone(&self, id: i32, phone: &str) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now();
        sqlx::query("UPDATE users SET phone = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(phone)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Grant staff rights; returns false when no such user exists yet
    pub async fn promote_to_staff(&self, username: &str) -> Result<bool, sqlx::Error> {
        let now = chrono::Utc::now();
        let result = sqlx::query("UPDATE users SET is_staff = TRUE, updated_at = $2 WHERE username = $1")
            .bind(username)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_all(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }
}
