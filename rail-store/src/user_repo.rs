use async_trait::async_trait;
use rail_core::repository::UserRepository;
use rail_core::{StoreError, StoreResult, User};
use rail_shared::Masked;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db_err;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    user_name: String,
    email: String,
    phone_number: String,
    wallet_balance: Decimal,
    version: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            user_name: row.user_name,
            email: Masked::new(row.email),
            phone_number: Masked::new(row.phone_number),
            wallet_balance: row.wallet_balance,
            version: row.version,
        }
    }
}

/// Version-checked balance write. Profile fields belong to the identity
/// service and are not written here.
pub(crate) async fn update_user(conn: &mut PgConnection, user: &User) -> StoreResult<User> {
    let result = sqlx::query(
        "UPDATE users SET wallet_balance = $2, version = version + 1 WHERE id = $1 AND version = $3",
    )
    .bind(user.id)
    .bind(user.wallet_balance)
    .bind(user.version)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user.id)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;
        return Err(if exists {
            StoreError::Conflict { entity: "user", id: user.id }
        } else {
            StoreError::NotFound { entity: "user", id: user.id }
        });
    }

    let mut stored = user.clone();
    stored.version += 1;
    Ok(stored)
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, user_name, email, phone_number, wallet_balance, version FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, user_name, email, phone_number, wallet_balance, version FROM users ORDER BY user_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        update_user(&mut conn, user).await
    }
}
