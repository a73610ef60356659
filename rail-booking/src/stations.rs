use rail_core::repository::Persistence;
use rail_core::Station;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::load;

#[derive(Debug, Clone, Deserialize)]
pub struct NewStation {
    pub name: String,
    pub code: String,
    pub pincode: String,
}

impl NewStation {
    fn validate(&self) -> BookingResult<()> {
        if self.name.trim().is_empty() || self.code.trim().is_empty() {
            return Err(BookingError::Validation("Station name and code are required".to_string()));
        }
        Ok(())
    }
}

pub struct StationService {
    store: Persistence,
}

impl StationService {
    pub fn new(store: Persistence) -> Self {
        Self { store }
    }

    pub async fn add_station(&self, request: NewStation) -> BookingResult<Station> {
        request.validate()?;
        self.ensure_code_free(&request.code, None).await?;

        let station = Station::new(request.name, request.code, request.pincode);
        self.store.stations.add(&station).await?;
        info!(station_id = %station.id, code = %station.code, "Station added");
        Ok(station)
    }

    pub async fn get_station(&self, id: Uuid) -> BookingResult<Station> {
        load::station(&self.store, id).await
    }

    pub async fn list_stations(&self) -> BookingResult<Vec<Station>> {
        Ok(self.store.stations.list().await?)
    }

    pub async fn update_station(&self, id: Uuid, request: NewStation) -> BookingResult<Station> {
        request.validate()?;
        let mut station = load::station(&self.store, id).await?;
        self.ensure_code_free(&request.code, Some(id)).await?;

        station.name = request.name;
        station.code = request.code;
        station.pincode = request.pincode;
        self.store.stations.update(&station).await?;
        Ok(station)
    }

    /// Refused while any train route runs through the station.
    pub async fn delete_station(&self, id: Uuid) -> BookingResult<()> {
        load::station(&self.store, id).await?;

        let trains = self.store.trains.list().await?;
        if let Some(train) = trains.iter().find(|t| t.route.station_ids().contains(&id)) {
            return Err(BookingError::Validation(format!(
                "Station is on the route of train {}",
                train.number
            )));
        }

        self.store.stations.delete(id).await?;
        info!(station_id = %id, "Station deleted");
        Ok(())
    }

    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> BookingResult<()> {
        let taken = self
            .store
            .stations
            .list()
            .await?
            .into_iter()
            .any(|s| s.code.eq_ignore_ascii_case(code) && Some(s.id) != except);
        if taken {
            return Err(BookingError::Validation(format!("Station code {} is already in use", code)));
        }
        Ok(())
    }
}
