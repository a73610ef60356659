use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rail_core::repository::{TicketFilter, TicketRepository};
use rail_core::{Gender, Passenger, PaymentStatus, StoreError, StoreResult, Ticket, TicketStatus};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db_err;

pub struct StoreTicketRepository {
    pool: PgPool,
}

impl StoreTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    train_id: Uuid,
    user_id: Uuid,
    source_station_id: Uuid,
    destination_station_id: Uuid,
    journey_date: NaiveDate,
    booking_date: DateTime<Utc>,
    total_amount: Decimal,
    payment_status: String,
    status: String,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    ticket_id: Uuid,
    name: String,
    age: i32,
    gender: Option<String>,
    seat_id: Option<Uuid>,
}

fn corrupt(entity: &'static str) -> impl Fn(rail_core::UnknownVariant) -> StoreError {
    move |e| StoreError::Corrupt {
        entity,
        detail: e.to_string(),
    }
}

impl PassengerRow {
    fn into_passenger(self) -> StoreResult<Passenger> {
        let gender = self
            .gender
            .map(|g| g.parse::<Gender>())
            .transpose()
            .map_err(corrupt("passenger"))?;
        Ok(Passenger {
            id: self.id,
            ticket_id: self.ticket_id,
            name: self.name,
            age: self.age,
            gender,
            seat_id: self.seat_id,
        })
    }
}

impl TicketRow {
    fn into_ticket(self, passengers: Vec<Passenger>) -> StoreResult<Ticket> {
        Ok(Ticket {
            id: self.id,
            train_id: self.train_id,
            user_id: self.user_id,
            source_station_id: self.source_station_id,
            destination_station_id: self.destination_station_id,
            journey_date: self.journey_date,
            booking_date: self.booking_date,
            passengers,
            total_amount: self.total_amount,
            payment_status: self.payment_status.parse::<PaymentStatus>().map_err(corrupt("ticket"))?,
            status: self.status.parse::<TicketStatus>().map_err(corrupt("ticket"))?,
            updated_at: self.updated_at,
        })
    }
}

const TICKET_COLUMNS: &str = "id, train_id, user_id, source_station_id, destination_station_id, \
     journey_date, booking_date, total_amount, payment_status, status, updated_at";

async fn fetch_passengers(
    conn: &mut PgConnection,
    ticket_ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<Passenger>>> {
    let rows: Vec<PassengerRow> = sqlx::query_as(
        "SELECT id, ticket_id, name, age, gender, seat_id FROM passengers \
         WHERE ticket_id = ANY($1) ORDER BY ticket_id, position",
    )
    .bind(ticket_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    let mut by_ticket: HashMap<Uuid, Vec<Passenger>> = HashMap::new();
    for row in rows {
        let ticket_id = row.ticket_id;
        by_ticket.entry(ticket_id).or_default().push(row.into_passenger()?);
    }
    Ok(by_ticket)
}

async fn assemble(conn: &mut PgConnection, rows: Vec<TicketRow>) -> StoreResult<Vec<Ticket>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut passengers = fetch_passengers(conn, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let list = passengers.remove(&row.id).unwrap_or_default();
            row.into_ticket(list)
        })
        .collect()
}

/// Replace the passenger list of a ticket.
async fn write_passengers(conn: &mut PgConnection, ticket: &Ticket) -> StoreResult<()> {
    sqlx::query("DELETE FROM passengers WHERE ticket_id = $1")
        .bind(ticket.id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    for (position, passenger) in ticket.passengers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO passengers (id, ticket_id, name, age, gender, seat_id, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(passenger.id)
        .bind(ticket.id)
        .bind(&passenger.name)
        .bind(passenger.age)
        .bind(passenger.gender.map(|g| g.as_str()))
        .bind(passenger.seat_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

pub(crate) async fn insert_ticket(conn: &mut PgConnection, ticket: &Ticket) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tickets (id, train_id, user_id, source_station_id, destination_station_id,
            journey_date, booking_date, total_amount, payment_status, status, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(ticket.id)
    .bind(ticket.train_id)
    .bind(ticket.user_id)
    .bind(ticket.source_station_id)
    .bind(ticket.destination_station_id)
    .bind(ticket.journey_date)
    .bind(ticket.booking_date)
    .bind(ticket.total_amount)
    .bind(ticket.payment_status.as_str())
    .bind(ticket.status.as_str())
    .bind(ticket.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    write_passengers(conn, ticket).await
}

pub(crate) async fn update_ticket(conn: &mut PgConnection, ticket: &Ticket) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE tickets
        SET source_station_id = $2, destination_station_id = $3, journey_date = $4,
            total_amount = $5, payment_status = $6, status = $7, updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(ticket.id)
    .bind(ticket.source_station_id)
    .bind(ticket.destination_station_id)
    .bind(ticket.journey_date)
    .bind(ticket.total_amount)
    .bind(ticket.payment_status.as_str())
    .bind(ticket.status.as_str())
    .bind(ticket.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: "ticket", id: ticket.id });
    }
    write_passengers(conn, ticket).await
}

pub(crate) async fn delete_ticket(conn: &mut PgConnection, id: Uuid) -> StoreResult<()> {
    sqlx::query("DELETE FROM passengers WHERE ticket_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: "ticket", id });
    }
    Ok(())
}

#[async_trait]
impl TicketRepository for StoreTicketRepository {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let row: Option<TicketRow> = sqlx::query_as(&format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(assemble(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: TicketFilter) -> StoreResult<Vec<Ticket>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tickets WHERE TRUE", TICKET_COLUMNS));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(train_id) = filter.train_id {
            qb.push(" AND train_id = ").push_bind(train_id);
        }
        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        qb.push(" ORDER BY booking_date");

        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let rows: Vec<TicketRow> = qb
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err)?;
        assemble(&mut conn, rows).await
    }

    async fn add(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_ticket(&mut tx, ticket).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        update_ticket(&mut tx, ticket).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        delete_ticket(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)
    }
}
