use async_trait::async_trait;
use rail_core::repository::StationRepository;
use rail_core::{Station, StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_err;

pub struct StoreStationRepository {
    pool: PgPool,
}

impl StoreStationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StationRow {
    id: Uuid,
    name: String,
    code: String,
    pincode: String,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            id: row.id,
            name: row.name,
            code: row.code,
            pincode: row.pincode,
        }
    }
}

#[async_trait]
impl StationRepository for StoreStationRepository {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Station>> {
        let row: Option<StationRow> =
            sqlx::query_as("SELECT id, name, code, pincode FROM stations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(Station::from))
    }

    async fn list(&self) -> StoreResult<Vec<Station>> {
        let rows: Vec<StationRow> = sqlx::query_as("SELECT id, name, code, pincode FROM stations ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Station::from).collect())
    }

    async fn add(&self, station: &Station) -> StoreResult<()> {
        sqlx::query("INSERT INTO stations (id, name, code, pincode) VALUES ($1, $2, $3, $4)")
            .bind(station.id)
            .bind(&station.name)
            .bind(&station.code)
            .bind(&station.pincode)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, station: &Station) -> StoreResult<()> {
        let result = sqlx::query("UPDATE stations SET name = $2, code = $3, pincode = $4 WHERE id = $1")
            .bind(station.id)
            .bind(&station.name)
            .bind(&station.code)
            .bind(&station.pincode)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "station", id: station.id });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM stations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "station", id });
        }
        Ok(())
    }
}
