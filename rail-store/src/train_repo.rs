use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rail_core::repository::TrainRepository;
use rail_core::{Route, Seat, SeatStatus, StoreError, StoreResult, Train};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db_err;

pub struct StoreTrainRepository {
    pool: PgPool,
}

impl StoreTrainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TrainRow {
    id: Uuid,
    name: String,
    number: String,
    total_seats: i32,
    available_seats: i32,
    fare: Decimal,
    source_station_id: Uuid,
    destination_station_id: Uuid,
    intermediate_station_ids: Vec<Uuid>,
    distance_km: i32,
    duration_minutes: i32,
    version: i64,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    train_id: Uuid,
    seat_number: String,
    status: String,
    passenger_id: Option<Uuid>,
}

impl SeatRow {
    fn into_seat(self) -> StoreResult<Seat> {
        let status = self.status.parse::<SeatStatus>().map_err(|e| StoreError::Corrupt {
            entity: "seat",
            detail: e.to_string(),
        })?;
        Ok(Seat {
            id: self.id,
            train_id: self.train_id,
            seat_number: self.seat_number,
            status,
            passenger_id: self.passenger_id,
        })
    }
}

impl TrainRow {
    fn into_train(self, seats: Vec<Seat>) -> Train {
        Train {
            id: self.id,
            name: self.name,
            number: self.number,
            total_seats: self.total_seats,
            available_seats: self.available_seats,
            fare: self.fare,
            route: Route {
                source_station_id: self.source_station_id,
                destination_station_id: self.destination_station_id,
                intermediate_station_ids: self.intermediate_station_ids,
                distance_km: self.distance_km,
                duration_minutes: self.duration_minutes,
            },
            seats,
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

const TRAIN_COLUMNS: &str = "id, name, number, total_seats, available_seats, fare, \
     source_station_id, destination_station_id, intermediate_station_ids, \
     distance_km, duration_minutes, version, updated_at";

async fn fetch_seats(conn: &mut PgConnection, train_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<Seat>>> {
    let rows: Vec<SeatRow> = sqlx::query_as(
        "SELECT id, train_id, seat_number, status, passenger_id FROM seats \
         WHERE train_id = ANY($1) ORDER BY position",
    )
    .bind(train_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    let mut by_train: HashMap<Uuid, Vec<Seat>> = HashMap::new();
    for row in rows {
        let train_id = row.train_id;
        by_train.entry(train_id).or_default().push(row.into_seat()?);
    }
    Ok(by_train)
}

pub(crate) async fn fetch_train(conn: &mut PgConnection, id: Uuid) -> StoreResult<Option<Train>> {
    let row: Option<TrainRow> = sqlx::query_as(&format!("SELECT {} FROM trains WHERE id = $1", TRAIN_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut seats = fetch_seats(conn, &[id]).await?;
    Ok(Some(row.into_train(seats.remove(&id).unwrap_or_default())))
}

/// Upsert the full seat map and drop seats no longer in it.
async fn write_seats(conn: &mut PgConnection, train: &Train) -> StoreResult<()> {
    let ids: Vec<Uuid> = train.seats.iter().map(|s| s.id).collect();
    let numbers: Vec<String> = train.seats.iter().map(|s| s.seat_number.clone()).collect();
    let statuses: Vec<String> = train.seats.iter().map(|s| s.status.as_str().to_string()).collect();
    let holders: Vec<Option<Uuid>> = train.seats.iter().map(|s| s.passenger_id).collect();
    let positions: Vec<i32> = (0..train.seats.len() as i32).collect();

    sqlx::query("DELETE FROM seats WHERE train_id = $1 AND NOT (id = ANY($2))")
        .bind(train.id)
        .bind(&ids)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    sqlx::query(
        r#"
        INSERT INTO seats (id, train_id, seat_number, status, passenger_id, position)
        SELECT u.id, $1, u.seat_number, u.status, u.passenger_id, u.position
        FROM UNNEST($2::uuid[], $3::text[], $4::text[], $5::uuid[], $6::int4[])
            AS u(id, seat_number, status, passenger_id, position)
        ON CONFLICT (id) DO UPDATE
        SET seat_number = EXCLUDED.seat_number,
            status = EXCLUDED.status,
            passenger_id = EXCLUDED.passenger_id,
            position = EXCLUDED.position
        "#,
    )
    .bind(train.id)
    .bind(&ids)
    .bind(&numbers)
    .bind(&statuses)
    .bind(&holders)
    .bind(&positions)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    Ok(())
}

pub(crate) async fn insert_train(conn: &mut PgConnection, train: &Train) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO trains (id, name, number, total_seats, available_seats, fare,
            source_station_id, destination_station_id, intermediate_station_ids,
            distance_km, duration_minutes, version, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(train.id)
    .bind(&train.name)
    .bind(&train.number)
    .bind(train.total_seats)
    .bind(train.available_seats)
    .bind(train.fare)
    .bind(train.route.source_station_id)
    .bind(train.route.destination_station_id)
    .bind(&train.route.intermediate_station_ids)
    .bind(train.route.distance_km)
    .bind(train.route.duration_minutes)
    .bind(train.version)
    .bind(train.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    write_seats(conn, train).await
}

/// Version-checked write. Returns the train as stored.
pub(crate) async fn update_train(conn: &mut PgConnection, train: &Train) -> StoreResult<Train> {
    let result = sqlx::query(
        r#"
        UPDATE trains
        SET name = $2, number = $3, total_seats = $4, available_seats = $5, fare = $6,
            source_station_id = $7, destination_station_id = $8, intermediate_station_ids = $9,
            distance_km = $10, duration_minutes = $11, version = version + 1, updated_at = $12
        WHERE id = $1 AND version = $13
        "#,
    )
    .bind(train.id)
    .bind(&train.name)
    .bind(&train.number)
    .bind(train.total_seats)
    .bind(train.available_seats)
    .bind(train.fare)
    .bind(train.route.source_station_id)
    .bind(train.route.destination_station_id)
    .bind(&train.route.intermediate_station_ids)
    .bind(train.route.distance_km)
    .bind(train.route.duration_minutes)
    .bind(train.updated_at)
    .bind(train.version)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trains WHERE id = $1)")
            .bind(train.id)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;
        return Err(if exists {
            StoreError::Conflict { entity: "train", id: train.id }
        } else {
            StoreError::NotFound { entity: "train", id: train.id }
        });
    }

    write_seats(conn, train).await?;

    let mut stored = train.clone();
    stored.version += 1;
    Ok(stored)
}

#[async_trait]
impl TrainRepository for StoreTrainRepository {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Train>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_train(&mut conn, id).await
    }

    async fn list(&self) -> StoreResult<Vec<Train>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let rows: Vec<TrainRow> = sqlx::query_as(&format!("SELECT {} FROM trains ORDER BY number", TRAIN_COLUMNS))
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut seats = fetch_seats(&mut conn, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let train_seats = seats.remove(&row.id).unwrap_or_default();
                row.into_train(train_seats)
            })
            .collect())
    }

    async fn add(&self, train: &Train) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_train(&mut tx, train).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, train: &Train) -> StoreResult<Train> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let stored = update_train(&mut tx, train).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("DELETE FROM seats WHERE train_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM trains WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "train", id });
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
