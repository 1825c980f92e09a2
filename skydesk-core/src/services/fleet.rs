use skydesk_shared::{Page, PageRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::found;
use crate::models::{
    Airplane, CreateAirplane, CreateSeat, GenerateSeatLayout, Seat, SeatClass, UpdateAirplane,
    UpdateSeat,
};
use crate::numbering;
use crate::repository::{AirplaneFilter, SeatFilter};
use crate::{CoreError, CoreResult, Repositories};

/// Airplanes and their seat maps.
#[derive(Clone)]
pub struct FleetService {
    repos: Repositories,
}

impl FleetService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create_airplane(&self, req: &CreateAirplane) -> CoreResult<Airplane> {
        let airline = found(self.repos.airlines.find(req.airline_id).await?, "Airline", req.airline_id)?;
        if !airline.is_active {
            return Err(CoreError::validation(format!("airline {} is inactive", airline.code)));
        }

        let seq = self
            .repos
            .sequences
            .next_value(&numbering::airplane_sequence_key(&airline.code))
            .await?;
        let airplane = Airplane::new(req, numbering::registration_code(&airline.code, seq))?;
        self.repos.airplanes.insert(&airplane).await?;

        info!(
            airplane_id = %airplane.id,
            registration = %airplane.registration_code,
            "Airplane registered"
        );
        Ok(airplane)
    }

    pub async fn get_airplane(&self, id: Uuid) -> CoreResult<Airplane> {
        found(self.repos.airplanes.find(id).await?, "Airplane", id)
    }

    pub async fn list_airplanes(
        &self,
        filter: &AirplaneFilter,
        page: PageRequest,
    ) -> CoreResult<Page<Airplane>> {
        self.repos.airplanes.list(filter, page).await
    }

    async fn ensure_no_pending_flights(&self, airplane: &Airplane) -> CoreResult<()> {
        let pending = self.repos.flights.count_pending_by_airplane(airplane.id).await?;
        if pending > 0 {
            warn!(airplane_id = %airplane.id, pending, "Refusing to deactivate airplane with pending flights");
            return Err(CoreError::conflict(format!(
                "airplane {} still has {} pending flights",
                airplane.registration_code, pending
            )));
        }
        Ok(())
    }

    pub async fn update_airplane(&self, id: Uuid, req: &UpdateAirplane) -> CoreResult<Airplane> {
        let mut airplane = self.get_airplane(id).await?;
        if req.is_active == Some(false) && airplane.is_active {
            self.ensure_no_pending_flights(&airplane).await?;
        }
        airplane.apply(req)?;
        self.repos.airplanes.update(&airplane).await?;
        info!(airplane_id = %id, status = %airplane.status, "Airplane updated");
        Ok(airplane)
    }

    /// Soft delete; refused while flights are still scheduled on the airplane.
    pub async fn delete_airplane(&self, id: Uuid) -> CoreResult<Airplane> {
        let mut airplane = self.get_airplane(id).await?;
        if !airplane.is_active {
            return Ok(airplane);
        }
        self.ensure_no_pending_flights(&airplane).await?;
        airplane.is_active = false;
        airplane.updated_at = chrono::Utc::now();
        self.repos.airplanes.update(&airplane).await?;
        info!(airplane_id = %id, "Airplane deactivated");
        Ok(airplane)
    }

    async fn active_airplane(&self, id: Uuid) -> CoreResult<Airplane> {
        let airplane = self.get_airplane(id).await?;
        if !airplane.is_active {
            return Err(CoreError::validation(format!(
                "airplane {} is inactive",
                airplane.registration_code
            )));
        }
        Ok(airplane)
    }

    async fn active_seat_class(&self, id: Uuid) -> CoreResult<SeatClass> {
        let seat_class = found(self.repos.seat_classes.find(id).await?, "Seat class", id)?;
        if !seat_class.is_active {
            return Err(CoreError::validation(format!("seat class {} is inactive", seat_class.code)));
        }
        Ok(seat_class)
    }

    pub async fn create_seat(&self, req: &CreateSeat) -> CoreResult<Seat> {
        self.active_airplane(req.airplane_id).await?;
        self.active_seat_class(req.seat_class_id).await?;
        let seat = Seat::from_request(req)?;
        self.repos.seats.insert_many(std::slice::from_ref(&seat)).await?;
        Ok(seat)
    }

    pub async fn generate_layout(
        &self,
        airplane_id: Uuid,
        req: &GenerateSeatLayout,
    ) -> CoreResult<Vec<Seat>> {
        let airplane = self.active_airplane(airplane_id).await?;
        let seat_class = self.active_seat_class(req.seat_class_id).await?;
        let seats = Seat::expand_layout(airplane_id, req)?;
        self.repos.seats.insert_many(&seats).await?;
        info!(
            airplane = %airplane.registration_code,
            seat_class = %seat_class.code,
            count = seats.len(),
            "Seat layout generated"
        );
        Ok(seats)
    }

    pub async fn get_seat(&self, id: Uuid) -> CoreResult<Seat> {
        found(self.repos.seats.find(id).await?, "Seat", id)
    }

    pub async fn list_seats(&self, airplane_id: Uuid, filter: &SeatFilter) -> CoreResult<Vec<Seat>> {
        self.get_airplane(airplane_id).await?;
        self.repos.seats.list_by_airplane(airplane_id, filter).await
    }

    pub async fn update_seat(&self, id: Uuid, req: &UpdateSeat) -> CoreResult<Seat> {
        let mut seat = self.get_seat(id).await?;
        if let Some(class_id) = req.seat_class_id {
            if class_id != seat.seat_class_id {
                self.active_seat_class(class_id).await?;
            }
        }
        seat.apply(req);
        self.repos.seats.update(&seat).await?;
        Ok(seat)
    }

    pub async fn delete_seat(&self, id: Uuid) -> CoreResult<Seat> {
        self.update_seat(id, &UpdateSeat { is_active: Some(false), ..Default::default() }).await
    }
}
