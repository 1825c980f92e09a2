use skydesk_shared::{Page, PageRequest};
use tracing::info;
use uuid::Uuid;

use super::found;
use crate::models::{Airport, CreateAirport, UpdateAirport};
use crate::repository::TextFilter;
use crate::{CoreError, CoreResult, Repositories};

#[derive(Clone)]
pub struct AirportService {
    repos: Repositories,
}

impl AirportService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, req: &CreateAirport) -> CoreResult<Airport> {
        let airport = Airport::new(req)?;
        if self.repos.airports.find_by_iata(&airport.iata_code).await?.is_some() {
            return Err(CoreError::conflict(format!("airport {} already exists", airport.iata_code)));
        }
        self.repos.airports.insert(&airport).await?;
        info!(airport_id = %airport.id, iata = %airport.iata_code, "Airport created");
        Ok(airport)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Airport> {
        found(self.repos.airports.find(id).await?, "Airport", id)
    }

    pub async fn get_by_iata(&self, iata_code: &str) -> CoreResult<Airport> {
        let code = crate::models::airport::normalize_iata(iata_code)?;
        found(self.repos.airports.find_by_iata(&code).await?, "Airport", code)
    }

    pub async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airport>> {
        self.repos.airports.list(filter, page).await
    }

    pub async fn update(&self, id: Uuid, req: &UpdateAirport) -> CoreResult<Airport> {
        let mut airport = self.get(id).await?;
        airport.apply(req)?;
        self.repos.airports.update(&airport).await?;
        info!(airport_id = %id, "Airport updated");
        Ok(airport)
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<Airport> {
        self.update(id, &UpdateAirport { is_active: Some(false), ..Default::default() }).await
    }
}
