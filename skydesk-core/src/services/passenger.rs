use skydesk_shared::{Page, PageRequest};
use tracing::info;
use uuid::Uuid;

use super::found;
use crate::models::{CreatePassenger, Passenger, UpdatePassenger};
use crate::repository::TextFilter;
use crate::{CoreError, CoreResult, Repositories};

#[derive(Clone)]
pub struct PassengerService {
    repos: Repositories,
}

impl PassengerService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn ensure_passport_free(&self, passenger: &Passenger) -> CoreResult<()> {
        if let Some(passport) = &passenger.passport_number {
            if let Some(holder) = self.repos.passengers.find_by_passport(passport.inner()).await? {
                if holder.id != passenger.id {
                    return Err(CoreError::conflict("passport number is already registered"));
                }
            }
        }
        Ok(())
    }

    pub async fn create(&self, req: &CreatePassenger) -> CoreResult<Passenger> {
        let passenger = Passenger::new(req)?;
        self.ensure_passport_free(&passenger).await?;
        self.repos.passengers.insert(&passenger).await?;
        info!(passenger_id = %passenger.id, passport = ?passenger.passport_number, "Passenger created");
        Ok(passenger)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Passenger> {
        found(self.repos.passengers.find(id).await?, "Passenger", id)
    }

    pub async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Passenger>> {
        self.repos.passengers.list(filter, page).await
    }

    pub async fn update(&self, id: Uuid, req: &UpdatePassenger) -> CoreResult<Passenger> {
        let mut passenger = self.get(id).await?;
        passenger.apply(req)?;
        if req.passport_number.is_some() {
            self.ensure_passport_free(&passenger).await?;
        }
        self.repos.passengers.update(&passenger).await?;
        info!(passenger_id = %id, "Passenger updated");
        Ok(passenger)
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<Passenger> {
        self.update(id, &UpdatePassenger { is_active: Some(false), ..Default::default() }).await
    }
}
