use skydesk_shared::{Page, PageRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::found;
use crate::models::{Airline, CreateAirline, UpdateAirline};
use crate::repository::TextFilter;
use crate::{CoreError, CoreResult, Repositories};

#[derive(Clone)]
pub struct AirlineService {
    repos: Repositories,
}

impl AirlineService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, req: &CreateAirline) -> CoreResult<Airline> {
        let airline = Airline::new(req)?;
        if self.repos.airlines.find_by_code(&airline.code).await?.is_some() {
            return Err(CoreError::conflict(format!("airline code {} already exists", airline.code)));
        }
        self.repos.airlines.insert(&airline).await?;
        info!(airline_id = %airline.id, code = %airline.code, "Airline created");
        Ok(airline)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Airline> {
        found(self.repos.airlines.find(id).await?, "Airline", id)
    }

    pub async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airline>> {
        self.repos.airlines.list(filter, page).await
    }

    /// Refuses to retire an airline that still operates airplanes.
    async fn ensure_no_fleet(&self, airline: &Airline) -> CoreResult<()> {
        let fleet = self.repos.airplanes.count_active_by_airline(airline.id).await?;
        if fleet > 0 {
            warn!(airline_id = %airline.id, fleet, "Refusing to deactivate airline with active airplanes");
            return Err(CoreError::conflict(format!(
                "airline {} still has {} active airplanes",
                airline.code, fleet
            )));
        }
        Ok(())
    }

    pub async fn update(&self, id: Uuid, req: &UpdateAirline) -> CoreResult<Airline> {
        let mut airline = self.get(id).await?;
        if req.is_active == Some(false) && airline.is_active {
            self.ensure_no_fleet(&airline).await?;
        }
        airline.apply(req)?;
        self.repos.airlines.update(&airline).await?;
        info!(airline_id = %id, "Airline updated");
        Ok(airline)
    }

    /// Soft delete; refused while the airline still operates airplanes.
    pub async fn delete(&self, id: Uuid) -> CoreResult<Airline> {
        let mut airline = self.get(id).await?;
        if !airline.is_active {
            return Ok(airline);
        }
        self.ensure_no_fleet(&airline).await?;
        airline.is_active = false;
        airline.updated_at = chrono::Utc::now();
        self.repos.airlines.update(&airline).await?;
        info!(airline_id = %id, "Airline deactivated");
        Ok(airline)
    }
}
