use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use skydesk_shared::{Page, PageRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::found;
use crate::models::{
    Airline, Airplane, Airport, ClassFlight, CreateClassFlight, CreateFlight, Flight, FlightStatus,
    Seat, SeatClass, UpdateClassFlight, UpdateFlight,
};
use crate::repository::{FlightFilter, SeatFilter};
use crate::{numbering, schedule, BusinessRules, CoreError, CoreResult, Repositories};

/// Class flight enriched with its seat class labels.
#[derive(Debug, Clone, Serialize)]
pub struct ClassFlightView {
    #[serde(flatten)]
    pub class_flight: ClassFlight,
    pub seat_class_code: String,
    pub seat_class_name: String,
    pub seat_class_rank: i32,
}

/// Search hit: a bookable flight plus the classes that can seat the party.
#[derive(Debug, Clone, Serialize)]
pub struct FlightOffer {
    pub flight: Flight,
    pub origin_iata: String,
    pub destination_iata: String,
    pub classes: Vec<ClassFlightView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    #[serde(flatten)]
    pub seat: Seat,
    pub seat_class_code: String,
    pub available: bool,
}

#[derive(Clone)]
pub struct FlightService {
    repos: Repositories,
    rules: Arc<BusinessRules>,
}

impl FlightService {
    pub fn new(repos: Repositories, rules: Arc<BusinessRules>) -> Self {
        Self { repos, rules }
    }

    async fn active_airline(&self, id: Uuid) -> CoreResult<Airline> {
        let airline = found(self.repos.airlines.find(id).await?, "Airline", id)?;
        if !airline.is_active {
            return Err(CoreError::validation(format!("airline {} is inactive", airline.code)));
        }
        Ok(airline)
    }

    async fn operational_airplane(&self, id: Uuid, airline_id: Uuid) -> CoreResult<Airplane> {
        let airplane = found(self.repos.airplanes.find(id).await?, "Airplane", id)?;
        if airplane.airline_id != airline_id {
            return Err(CoreError::validation(format!(
                "airplane {} does not belong to this airline",
                airplane.registration_code
            )));
        }
        if !airplane.is_operational() {
            return Err(CoreError::validation(format!(
                "airplane {} is not available for service",
                airplane.registration_code
            )));
        }
        Ok(airplane)
    }

    async fn active_airport(&self, id: Uuid) -> CoreResult<Airport> {
        let airport = found(self.repos.airports.find(id).await?, "Airport", id)?;
        if !airport.is_active {
            return Err(CoreError::validation(format!("airport {} is inactive", airport.iata_code)));
        }
        Ok(airport)
    }

    /// Search party size; zero means one, anything above a single booking's cap is rejected.
    fn party_size(&self, passengers: u32) -> CoreResult<i32> {
        let max = self.rules.max_passengers_per_booking;
        let party = passengers.max(1);
        if party as usize > max {
            return Err(CoreError::validation(format!(
                "passengers must be between 1 and {}",
                max
            )));
        }
        i32::try_from(party).map_err(|_| CoreError::validation("passengers is out of range"))
    }

    fn check_lead_time(&self, departure: chrono::DateTime<Utc>) -> CoreResult<()> {
        let earliest = Utc::now() + Duration::minutes(self.rules.min_departure_lead_minutes.max(0));
        if departure <= earliest {
            return Err(CoreError::validation(format!(
                "departure_time must be after {}",
                earliest.to_rfc3339()
            )));
        }
        Ok(())
    }

    /// Rejects the slot if the airplane already flies within it (turnaround included).
    async fn check_airplane_free(&self, flight: &Flight, exclude: Option<Uuid>) -> CoreResult<()> {
        let (from, to) = schedule::blocked_window(
            flight.departure_time,
            flight.arrival_time,
            self.rules.turnaround_minutes,
        );
        let nearby = self.repos.flights.list_for_airplane(flight.airplane_id, from, to).await?;
        if let Some(clash) = schedule::find_conflict(
            &nearby,
            flight.departure_time,
            flight.arrival_time,
            self.rules.turnaround_minutes,
            exclude,
        ) {
            warn!(
                airplane_id = %flight.airplane_id,
                clash = %clash.flight_number,
                "Overlapping flight rejected"
            );
            return Err(CoreError::conflict(format!(
                "airplane is already assigned to flight {} ({} - {})",
                clash.flight_number,
                clash.departure_time.to_rfc3339(),
                clash.arrival_time.to_rfc3339()
            )));
        }
        Ok(())
    }

    pub async fn create(&self, req: &CreateFlight) -> CoreResult<Flight> {
        crate::models::flight::check_route_and_times(
            req.origin_airport_id,
            req.destination_airport_id,
            req.departure_time,
            req.arrival_time,
        )?;
        let airline = self.active_airline(req.airline_id).await?;
        self.operational_airplane(req.airplane_id, airline.id).await?;
        self.active_airport(req.origin_airport_id).await?;
        self.active_airport(req.destination_airport_id).await?;
        self.check_lead_time(req.departure_time)?;

        // Placeholder number until the slot is known to be free.
        let mut flight = Flight::new(req, String::new())?;
        self.check_airplane_free(&flight, None).await?;

        let seq = self
            .repos
            .sequences
            .next_value(&numbering::flight_sequence_key(&airline.code))
            .await?;
        flight.flight_number = numbering::flight_number(&airline.code, seq);
        self.repos.flights.insert(&flight).await?;

        info!(
            flight_id = %flight.id,
            flight_number = %flight.flight_number,
            departure = %flight.departure_time,
            "Flight scheduled"
        );
        Ok(flight)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Flight> {
        found(self.repos.flights.find(id).await?, "Flight", id)
    }

    pub async fn list(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>> {
        self.repos.flights.list(filter, page).await
    }

    pub async fn update(&self, id: Uuid, req: &UpdateFlight) -> CoreResult<Flight> {
        let mut flight = self.get(id).await?;
        if !flight.is_active || !flight.status.is_open() {
            return Err(CoreError::validation(format!(
                "flight {} can no longer be edited ({})",
                flight.flight_number, flight.status
            )));
        }
        let previous_status = flight.status;
        let previous_airplane = flight.airplane_id;
        flight.apply(req)?;

        if flight.airplane_id != previous_airplane {
            self.operational_airplane(flight.airplane_id, flight.airline_id).await?;
            // Seat assignments and class pools belong to the old cabin.
            if !self.repos.bookings.active_ids_for_flight(id).await?.is_empty() {
                return Err(CoreError::conflict(format!(
                    "flight {} has bookings; the airplane cannot be swapped",
                    flight.flight_number
                )));
            }
        }
        if req.origin_airport_id.is_some() {
            self.active_airport(flight.origin_airport_id).await?;
        }
        if req.destination_airport_id.is_some() {
            self.active_airport(flight.destination_airport_id).await?;
        }
        if req.departure_time.is_some() {
            self.check_lead_time(flight.departure_time)?;
        }
        self.check_airplane_free(&flight, Some(flight.id)).await?;

        self.repos.flights.update(&flight, previous_status).await?;
        info!(flight_id = %id, flight_number = %flight.flight_number, "Flight rescheduled");
        Ok(flight)
    }

    /// Moves the flight through its lifecycle. Cancelling also cancels its bookings.
    pub async fn change_status(&self, id: Uuid, status: FlightStatus) -> CoreResult<Flight> {
        let mut flight = self.get(id).await?;
        if !flight.status.can_transition_to(status) {
            return Err(CoreError::validation(format!(
                "flight {} cannot move from {} to {}",
                flight.flight_number, flight.status, status
            )));
        }
        let previous = flight.status;
        flight.status = status;
        flight.updated_at = Utc::now();

        if status == FlightStatus::Cancelled {
            let cancelled = self.repos.flights.cancel_with_bookings(&flight, previous).await?;
            info!(
                flight_number = %flight.flight_number,
                cancelled_bookings = cancelled,
                "Flight cancelled"
            );
        } else {
            self.repos.flights.update(&flight, previous).await?;
            info!(flight_number = %flight.flight_number, status = %status, "Flight status changed");
        }
        Ok(flight)
    }

    /// Soft delete; refused while passengers hold bookings on the flight.
    pub async fn delete(&self, id: Uuid) -> CoreResult<Flight> {
        let mut flight = self.get(id).await?;
        if !flight.is_active {
            return Ok(flight);
        }
        let bookings = self.repos.bookings.active_ids_for_flight(id).await?;
        if !bookings.is_empty() {
            return Err(CoreError::conflict(format!(
                "flight {} has {} active bookings",
                flight.flight_number,
                bookings.len()
            )));
        }
        flight.is_active = false;
        flight.updated_at = Utc::now();
        self.repos.flights.update(&flight, flight.status).await?;
        info!(flight_id = %id, "Flight deactivated");
        Ok(flight)
    }

    pub async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        passengers: u32,
    ) -> CoreResult<Vec<FlightOffer>> {
        let origin = self.airport_by_code(origin).await?;
        let destination = self.airport_by_code(destination).await?;
        let from = date
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .ok_or_else(|| CoreError::validation("invalid search date"))?;
        let to = from + Duration::days(1);
        let party = self.party_size(passengers)?;
        let now = Utc::now();

        let flights = self.repos.flights.search(origin.id, destination.id, from, to).await?;
        let classes = self.seat_class_index().await?;

        let mut offers = Vec::new();
        for flight in flights.into_iter().filter(|f| f.is_bookable(now)) {
            let options: Vec<ClassFlightView> = self
                .repos
                .class_flights
                .list_by_flight(flight.id)
                .await?
                .into_iter()
                .filter(|c| c.is_active && c.available_seats >= party)
                .filter_map(|c| Self::view(c, &classes))
                .collect();
            if options.is_empty() {
                continue;
            }
            offers.push(FlightOffer {
                flight,
                origin_iata: origin.iata_code.clone(),
                destination_iata: destination.iata_code.clone(),
                classes: sorted(options),
            });
        }
        Ok(offers)
    }

    async fn airport_by_code(&self, code: &str) -> CoreResult<Airport> {
        let code = crate::models::airport::normalize_iata(code)?;
        found(self.repos.airports.find_by_iata(&code).await?, "Airport", code)
    }

    async fn seat_class_index(&self) -> CoreResult<HashMap<Uuid, SeatClass>> {
        Ok(self
            .repos
            .seat_classes
            .list(true)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect())
    }

    fn view(class_flight: ClassFlight, classes: &HashMap<Uuid, SeatClass>) -> Option<ClassFlightView> {
        classes.get(&class_flight.seat_class_id).map(|c| ClassFlightView {
            seat_class_code: c.code.clone(),
            seat_class_name: c.name.clone(),
            seat_class_rank: c.rank,
            class_flight,
        })
    }

    /// Every active seat of the flight's airplane with its current availability.
    pub async fn seat_map(&self, flight_id: Uuid) -> CoreResult<Vec<SeatAvailability>> {
        let flight = self.get(flight_id).await?;
        let seats = self
            .repos
            .seats
            .list_by_airplane(flight.airplane_id, &SeatFilter::default())
            .await?;
        let taken = self.repos.bookings.taken_seat_ids(flight_id).await?;
        let classes = self.seat_class_index().await?;

        Ok(seats
            .into_iter()
            .map(|seat| SeatAvailability {
                seat_class_code: classes
                    .get(&seat.seat_class_id)
                    .map(|c| c.code.clone())
                    .unwrap_or_default(),
                available: !taken.contains(&seat.id),
                seat,
            })
            .collect())
    }

    pub async fn create_class(&self, req: &CreateClassFlight) -> CoreResult<ClassFlightView> {
        let flight = self.get(req.flight_id).await?;
        if !flight.is_active || !flight.status.is_open() {
            return Err(CoreError::validation(format!(
                "flight {} is not open for sale",
                flight.flight_number
            )));
        }
        let seat_class = found(
            self.repos.seat_classes.find(req.seat_class_id).await?,
            "Seat class",
            req.seat_class_id,
        )?;
        if !seat_class.is_active {
            return Err(CoreError::validation(format!("seat class {} is inactive", seat_class.code)));
        }
        if self
            .repos
            .class_flights
            .find_by_flight_and_class(flight.id, seat_class.id)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "flight {} already sells {}",
                flight.flight_number, seat_class.code
            )));
        }

        let capacity = self.repos.seats.count_active(flight.airplane_id, seat_class.id).await?;
        let class_flight = ClassFlight::new(req, capacity, &self.rules.currency)?;
        self.repos.class_flights.insert(&class_flight).await?;
        info!(
            flight_number = %flight.flight_number,
            seat_class = %seat_class.code,
            seats = class_flight.total_seats,
            "Fare class opened"
        );

        Ok(ClassFlightView {
            seat_class_code: seat_class.code,
            seat_class_name: seat_class.name,
            seat_class_rank: seat_class.rank,
            class_flight,
        })
    }

    pub async fn get_class(&self, id: Uuid) -> CoreResult<ClassFlightView> {
        let class_flight = found(self.repos.class_flights.find(id).await?, "Class flight", id)?;
        let seat_class = found(
            self.repos.seat_classes.find(class_flight.seat_class_id).await?,
            "Seat class",
            class_flight.seat_class_id,
        )?;
        Ok(ClassFlightView {
            seat_class_code: seat_class.code,
            seat_class_name: seat_class.name,
            seat_class_rank: seat_class.rank,
            class_flight,
        })
    }

    pub async fn list_classes(&self, flight_id: Uuid) -> CoreResult<Vec<ClassFlightView>> {
        self.get(flight_id).await?;
        let classes = self.seat_class_index().await?;
        let views = self
            .repos
            .class_flights
            .list_by_flight(flight_id)
            .await?
            .into_iter()
            .filter_map(|c| Self::view(c, &classes))
            .collect();
        Ok(sorted(views))
    }

    pub async fn update_class(&self, id: Uuid, req: &UpdateClassFlight) -> CoreResult<ClassFlightView> {
        let ClassFlightView {
            mut class_flight,
            seat_class_code,
            seat_class_name,
            seat_class_rank,
        } = self.get_class(id).await?;
        let flight = self.get(class_flight.flight_id).await?;
        let capacity = self
            .repos
            .seats
            .count_active(flight.airplane_id, class_flight.seat_class_id)
            .await?;
        if req.is_active == Some(false) && class_flight.is_active {
            ensure_unsold(&class_flight)?;
        }
        class_flight.apply(req, capacity)?;
        let stored = self.repos.class_flights.update(&class_flight).await?;
        Ok(ClassFlightView {
            class_flight: stored,
            seat_class_code,
            seat_class_name,
            seat_class_rank,
        })
    }

    /// Soft delete; refused once seats have been sold.
    pub async fn delete_class(&self, id: Uuid) -> CoreResult<ClassFlightView> {
        self.update_class(id, &UpdateClassFlight { is_active: Some(false), ..Default::default() })
            .await
    }
}

fn ensure_unsold(class_flight: &ClassFlight) -> CoreResult<()> {
    let sold = class_flight.sold_seats();
    if sold > 0 {
        warn!(class_flight_id = %class_flight.id, sold, "Refusing to deactivate class with sold seats");
        return Err(CoreError::conflict(format!(
            "{} seats already sold in this class",
            sold
        )));
    }
    Ok(())
}

fn sorted(mut views: Vec<ClassFlightView>) -> Vec<ClassFlightView> {
    views.sort_by(|a, b| {
        a.seat_class_rank
            .cmp(&b.seat_class_rank)
            .then_with(|| a.seat_class_code.cmp(&b.seat_class_code))
    });
    views
}
