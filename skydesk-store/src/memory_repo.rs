//! Process-local backend used by tests and `storage.backend = "memory"`.
//!
//! Every table sits behind one lock, so each repository call is atomic the same
//! way a single Postgres transaction is.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_core::models::{
    Airline, Airplane, Airport, Billing, BillingStatus, Booking, BookingStatus, ClassFlight, Flight,
    FlightStatus, PayBilling, Passenger, Seat, SeatClass,
};
use skydesk_core::repository::{
    AirlineRepository, AirplaneFilter, AirplaneRepository, AirportRepository, BillingFilter,
    BillingRepository, BookingFilter, BookingRepository, ClassFlightRepository, FlightFilter,
    FlightRepository, PassengerRepository, SeatClassRepository, SeatFilter, SeatRepository,
    SequenceRepository, TextFilter,
};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    sequences: HashMap<String, i64>,
    airlines: HashMap<Uuid, Airline>,
    airports: HashMap<Uuid, Airport>,
    seat_classes: HashMap<Uuid, SeatClass>,
    airplanes: HashMap<Uuid, Airplane>,
    seats: HashMap<Uuid, Seat>,
    flights: HashMap<Uuid, Flight>,
    class_flights: HashMap<Uuid, ClassFlight>,
    passengers: HashMap<Uuid, Passenger>,
    bookings: HashMap<Uuid, Booking>,
    billings: HashMap<Uuid, Billing>,
}

impl Tables {
    /// Bookings still holding seats on the flight.
    fn active_bookings(&self, flight_id: Uuid) -> impl Iterator<Item = &Booking> {
        self.bookings
            .values()
            .filter(move |b| b.flight_id == flight_id && b.status.is_active())
    }

    /// Flight whose stored status is still `expected`.
    fn flight_in_status(&mut self, flight: &Flight, expected: FlightStatus) -> CoreResult<&mut Flight> {
        let stored = self
            .flights
            .get_mut(&flight.id)
            .ok_or_else(|| missing("flight", flight.id))?;
        if stored.status != expected {
            return Err(CoreError::conflict(format!(
                "flight {} is no longer {}; reload and retry",
                flight.flight_number, expected
            )));
        }
        Ok(stored)
    }

    fn cancel_booking(&mut self, id: Uuid, at: DateTime<Utc>) -> CoreResult<Booking> {
        let booking = self.bookings.get(&id).ok_or_else(|| missing("booking", id))?;
        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::conflict(format!("booking {} is already cancelled", id)));
        }
        let returned = booking.seats_per_class();

        for (class_flight_id, seats) in returned {
            if let Some(class_flight) = self.class_flights.get_mut(&class_flight_id) {
                class_flight.available_seats += seats;
                class_flight.updated_at = at;
            }
        }

        if let Some(billing) = self.billings.values_mut().find(|b| b.booking_id == id) {
            if billing.status == BillingStatus::Paid {
                billing.refunded_at = Some(at);
            }
            billing.status = billing.status.on_cancel();
            billing.updated_at = at;
        }

        let booking = self.bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(at);
        booking.updated_at = at;
        Ok(booking.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(what: &str, value: impl std::fmt::Display) -> CoreError {
    CoreError::conflict(format!("{} '{}' already exists", what, value))
}

fn missing(entity: &'static str, id: Uuid) -> CoreError {
    CoreError::not_found(entity, id)
}

/// Mirrors `ILIKE '%q%'` on any of the given fields.
fn matches_text(q: &Option<String>, fields: &[&str]) -> bool {
    match q {
        Some(q) => {
            let needle = q.trim().to_lowercase();
            fields.iter().any(|f| f.to_lowercase().contains(&needle))
        }
        None => true,
    }
}

#[async_trait]
impl SequenceRepository for MemoryStore {
    async fn next_value(&self, key: &str) -> CoreResult<i64> {
        let mut tables = self.tables.write().await;
        let value = tables.sequences.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[async_trait]
impl AirlineRepository for MemoryStore {
    async fn insert(&self, airline: &Airline) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.airlines.values().any(|a| a.code == airline.code) {
            return Err(duplicate("airline code", &airline.code));
        }
        tables.airlines.insert(airline.id, airline.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airline>> {
        Ok(self.tables.read().await.airlines.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airline>> {
        let tables = self.tables.read().await;
        Ok(tables.airlines.values().find(|a| a.code == code).cloned())
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airline>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Airline> = tables
            .airlines
            .values()
            .filter(|a| filter.include_inactive || a.is_active)
            .filter(|a| matches_text(&filter.q, &[a.code.as_str(), a.name.as_str()]))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(Page::from_vec(items, page))
    }

    async fn update(&self, airline: &Airline) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .airlines
            .get_mut(&airline.id)
            .ok_or_else(|| missing("airline", airline.id))?;
        *stored = airline.clone();
        Ok(())
    }
}

#[async_trait]
impl AirportRepository for MemoryStore {
    async fn insert(&self, airport: &Airport) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.airports.values().any(|a| a.iata_code == airport.iata_code) {
            return Err(duplicate("airport IATA code", &airport.iata_code));
        }
        tables.airports.insert(airport.id, airport.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airport>> {
        Ok(self.tables.read().await.airports.get(&id).cloned())
    }

    async fn find_by_iata(&self, iata_code: &str) -> CoreResult<Option<Airport>> {
        let tables = self.tables.read().await;
        Ok(tables.airports.values().find(|a| a.iata_code == iata_code).cloned())
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airport>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Airport> = tables
            .airports
            .values()
            .filter(|a| filter.include_inactive || a.is_active)
            .filter(|a| matches_text(&filter.q, &[a.iata_code.as_str(), a.name.as_str(), a.city.as_str()]))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.iata_code.cmp(&b.iata_code));
        Ok(Page::from_vec(items, page))
    }

    async fn update(&self, airport: &Airport) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .airports
            .get_mut(&airport.id)
            .ok_or_else(|| missing("airport", airport.id))?;
        *stored = airport.clone();
        Ok(())
    }
}

#[async_trait]
impl SeatClassRepository for MemoryStore {
    async fn insert(&self, seat_class: &SeatClass) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.seat_classes.values().any(|c| c.code == seat_class.code) {
            return Err(duplicate("seat class code", &seat_class.code));
        }
        tables.seat_classes.insert(seat_class.id, seat_class.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<SeatClass>> {
        Ok(self.tables.read().await.seat_classes.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> CoreResult<Option<SeatClass>> {
        let tables = self.tables.read().await;
        Ok(tables.seat_classes.values().find(|c| c.code == code).cloned())
    }

    async fn list(&self, include_inactive: bool) -> CoreResult<Vec<SeatClass>> {
        let tables = self.tables.read().await;
        let mut items: Vec<SeatClass> = tables
            .seat_classes
            .values()
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.rank, &a.code).cmp(&(b.rank, &b.code)));
        Ok(items)
    }

    async fn update(&self, seat_class: &SeatClass) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .seat_classes
            .get_mut(&seat_class.id)
            .ok_or_else(|| missing("seat class", seat_class.id))?;
        *stored = seat_class.clone();
        Ok(())
    }
}

#[async_trait]
impl AirplaneRepository for MemoryStore {
    async fn insert(&self, airplane: &Airplane) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.airlines.contains_key(&airplane.airline_id) {
            return Err(CoreError::validation(format!("airline {} does not exist", airplane.airline_id)));
        }
        if tables
            .airplanes
            .values()
            .any(|a| a.registration_code == airplane.registration_code)
        {
            return Err(duplicate("registration code", &airplane.registration_code));
        }
        tables.airplanes.insert(airplane.id, airplane.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airplane>> {
        Ok(self.tables.read().await.airplanes.get(&id).cloned())
    }

    async fn list(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Airplane> = tables
            .airplanes
            .values()
            .filter(|a| filter.include_inactive || a.is_active)
            .filter(|a| filter.airline_id.is_none_or(|id| a.airline_id == id))
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.registration_code.cmp(&b.registration_code));
        Ok(Page::from_vec(items, page))
    }

    async fn update(&self, airplane: &Airplane) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .airplanes
            .get_mut(&airplane.id)
            .ok_or_else(|| missing("airplane", airplane.id))?;
        *stored = airplane.clone();
        Ok(())
    }

    async fn count_active_by_airline(&self, airline_id: Uuid) -> CoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .airplanes
            .values()
            .filter(|a| a.airline_id == airline_id && a.is_active)
            .count() as i64)
    }
}

#[async_trait]
impl SeatRepository for MemoryStore {
    async fn insert_many(&self, seats: &[Seat]) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let mut incoming: Vec<(Uuid, &str)> = Vec::with_capacity(seats.len());
        for seat in seats {
            let key = (seat.airplane_id, seat.seat_number.as_str());
            let exists = tables
                .seats
                .values()
                .any(|s| s.airplane_id == seat.airplane_id && s.seat_number == seat.seat_number);
            if exists || incoming.contains(&key) {
                return Err(CoreError::conflict(format!("seat {} already exists", seat.seat_number)));
            }
            incoming.push(key);
        }
        for seat in seats {
            tables.seats.insert(seat.id, seat.clone());
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Seat>> {
        Ok(self.tables.read().await.seats.get(&id).cloned())
    }

    async fn list_by_airplane(&self, airplane_id: Uuid, filter: &SeatFilter) -> CoreResult<Vec<Seat>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Seat> = tables
            .seats
            .values()
            .filter(|s| s.airplane_id == airplane_id)
            .filter(|s| filter.include_inactive || s.is_active)
            .filter(|s| filter.seat_class_id.is_none_or(|id| s.seat_class_id == id))
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.row, &a.letter).cmp(&(b.row, &b.letter)));
        Ok(items)
    }

    async fn update(&self, seat: &Seat) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.seats.get_mut(&seat.id).ok_or_else(|| missing("seat", seat.id))?;
        *stored = seat.clone();
        Ok(())
    }

    async fn count_active(&self, airplane_id: Uuid, seat_class_id: Uuid) -> CoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .seats
            .values()
            .filter(|s| s.airplane_id == airplane_id && s.seat_class_id == seat_class_id && s.is_active)
            .count() as i64)
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn insert(&self, flight: &Flight) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.flights.values().any(|f| f.flight_number == flight.flight_number) {
            return Err(duplicate("flight number", &flight.flight_number));
        }
        tables.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        Ok(self.tables.read().await.flights.get(&id).cloned())
    }

    async fn list(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| filter.include_inactive || f.is_active)
            .filter(|f| filter.airline_id.is_none_or(|id| f.airline_id == id))
            .filter(|f| filter.airplane_id.is_none_or(|id| f.airplane_id == id))
            .filter(|f| filter.status.is_none_or(|s| f.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (a.departure_time, &a.flight_number).cmp(&(b.departure_time, &b.flight_number))
        });
        Ok(Page::from_vec(items, page))
    }

    async fn update(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.flight_in_status(flight, expected)?;
        *stored = flight.clone();
        Ok(())
    }

    async fn cancel_with_bookings(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<usize> {
        let mut tables = self.tables.write().await;
        let stored = tables.flight_in_status(flight, expected)?;
        stored.status = flight.status;
        stored.updated_at = flight.updated_at;

        let active: Vec<Uuid> = tables.active_bookings(flight.id).map(|b| b.id).collect();
        for booking_id in &active {
            tables.cancel_booking(*booking_id, flight.updated_at)?;
        }
        Ok(active.len())
    }

    async fn list_for_airplane(
        &self,
        airplane_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| f.airplane_id == airplane_id && f.is_active && f.status.is_pending())
            .filter(|f| f.departure_time < to && f.arrival_time > from)
            .cloned()
            .collect();
        items.sort_by_key(|f| f.departure_time);
        Ok(items)
    }

    async fn search(
        &self,
        origin_airport_id: Uuid,
        destination_airport_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| {
                f.origin_airport_id == origin_airport_id
                    && f.destination_airport_id == destination_airport_id
                    && f.is_active
                    && f.status.is_open()
                    && f.departure_time >= from
                    && f.departure_time < to
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (a.departure_time, &a.flight_number).cmp(&(b.departure_time, &b.flight_number))
        });
        Ok(items)
    }

    async fn count_pending_by_airplane(&self, airplane_id: Uuid) -> CoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .flights
            .values()
            .filter(|f| f.airplane_id == airplane_id && f.is_active && f.status.is_pending())
            .count() as i64)
    }
}

#[async_trait]
impl ClassFlightRepository for MemoryStore {
    async fn insert(&self, class_flight: &ClassFlight) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.class_flights.values().any(|c| {
            c.flight_id == class_flight.flight_id && c.seat_class_id == class_flight.seat_class_id
        }) {
            return Err(CoreError::conflict(format!(
                "flight {} already offers seat class {}",
                class_flight.flight_id, class_flight.seat_class_id
            )));
        }
        tables.class_flights.insert(class_flight.id, class_flight.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<ClassFlight>> {
        Ok(self.tables.read().await.class_flights.get(&id).cloned())
    }

    async fn find_by_flight_and_class(
        &self,
        flight_id: Uuid,
        seat_class_id: Uuid,
    ) -> CoreResult<Option<ClassFlight>> {
        let tables = self.tables.read().await;
        Ok(tables
            .class_flights
            .values()
            .find(|c| c.flight_id == flight_id && c.seat_class_id == seat_class_id)
            .cloned())
    }

    async fn list_by_flight(&self, flight_id: Uuid) -> CoreResult<Vec<ClassFlight>> {
        let tables = self.tables.read().await;
        let mut items: Vec<ClassFlight> = tables
            .class_flights
            .values()
            .filter(|c| c.flight_id == flight_id)
            .cloned()
            .collect();
        items.sort_by_key(|c| c.created_at);
        Ok(items)
    }

    async fn update(&self, class_flight: &ClassFlight) -> CoreResult<ClassFlight> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .class_flights
            .get_mut(&class_flight.id)
            .ok_or_else(|| missing("class flight", class_flight.id))?;
        let sold = stored.sold_seats();
        let retiring = stored.is_active && !class_flight.is_active;
        if sold > class_flight.total_seats || (retiring && sold > 0) {
            return Err(CoreError::conflict(format!(
                "class flight {} has sold seats that this change would drop",
                class_flight.id
            )));
        }
        stored.price_cents = class_flight.price_cents;
        stored.total_seats = class_flight.total_seats;
        stored.available_seats = class_flight.total_seats - sold;
        stored.is_active = class_flight.is_active;
        stored.updated_at = class_flight.updated_at;
        Ok(stored.clone())
    }
}

#[async_trait]
impl PassengerRepository for MemoryStore {
    async fn insert(&self, passenger: &Passenger) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(passport) = &passenger.passport_number {
            if tables
                .passengers
                .values()
                .any(|p| p.passport_number.as_ref() == Some(passport))
            {
                return Err(CoreError::conflict("passport number is already registered"));
            }
        }
        tables.passengers.insert(passenger.id, passenger.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Passenger>> {
        Ok(self.tables.read().await.passengers.get(&id).cloned())
    }

    async fn find_by_passport(&self, passport_number: &str) -> CoreResult<Option<Passenger>> {
        let tables = self.tables.read().await;
        Ok(tables
            .passengers
            .values()
            .find(|p| p.passport_number.as_ref().map(|n| n.inner().as_str()) == Some(passport_number))
            .cloned())
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Passenger>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Passenger> = tables
            .passengers
            .values()
            .filter(|p| filter.include_inactive || p.is_active)
            .filter(|p| matches_text(&filter.q, &[p.first_name.as_str(), p.last_name.as_str(), p.email.as_str()]))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(Page::from_vec(items, page))
    }

    async fn update(&self, passenger: &Passenger) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(passport) = &passenger.passport_number {
            if tables
                .passengers
                .values()
                .any(|p| p.id != passenger.id && p.passport_number.as_ref() == Some(passport))
            {
                return Err(CoreError::conflict("passport number is already registered"));
            }
        }
        let stored = tables
            .passengers
            .get_mut(&passenger.id)
            .ok_or_else(|| missing("passenger", passenger.id))?;
        *stored = passenger.clone();
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create(&self, booking: &Booking, billing: &Billing) -> CoreResult<()> {
        let mut tables = self.tables.write().await;

        let open = tables
            .flights
            .get(&booking.flight_id)
            .is_some_and(|f| f.is_active && f.status.is_open());
        if !open {
            return Err(CoreError::conflict(format!(
                "flight {} is no longer open for booking",
                booking.flight_id
            )));
        }

        if tables.bookings.values().any(|b| b.booking_number == booking.booking_number) {
            return Err(duplicate("booking number", &booking.booking_number));
        }

        let requested = booking.seats_per_class();
        for (class_flight_id, seats) in &requested {
            let available = tables
                .class_flights
                .get(class_flight_id)
                .filter(|c| c.is_active)
                .map(|c| c.available_seats)
                .unwrap_or(0);
            if available < *seats {
                return Err(CoreError::conflict(format!(
                    "class flight {} has fewer than {} seats left",
                    class_flight_id, seats
                )));
            }
        }

        for ticket in &booking.tickets {
            let clash = tables.active_bookings(booking.flight_id).flat_map(|b| &b.tickets).any(|t| {
                t.passenger_id == ticket.passenger_id
                    || (ticket.seat_id.is_some() && t.seat_id == ticket.seat_id)
            });
            if clash {
                return Err(CoreError::conflict(format!(
                    "seat or passenger of ticket {} is already booked on this flight",
                    ticket.id
                )));
            }
        }

        for (class_flight_id, seats) in requested {
            if let Some(class_flight) = tables.class_flights.get_mut(&class_flight_id) {
                class_flight.available_seats -= seats;
                class_flight.updated_at = booking.created_at;
            }
        }
        tables.bookings.insert(booking.id, booking.clone());
        tables.billings.insert(billing.id, billing.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn find_by_number(&self, booking_number: &str) -> CoreResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.booking_number == booking_number)
            .cloned())
    }

    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> CoreResult<Page<Booking>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| filter.flight_id.is_none_or(|id| b.flight_id == id))
            .filter(|b| filter.passenger_id.is_none_or(|id| b.passenger_ids().any(|p| p == id)))
            .filter(|b| filter.status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (Reverse(a.created_at), Reverse(&a.booking_number))
                .cmp(&(Reverse(b.created_at), Reverse(&b.booking_number)))
        });
        Ok(Page::from_vec(items, page))
    }

    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> CoreResult<Booking> {
        self.tables.write().await.cancel_booking(id, at)
    }

    async fn taken_seat_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .active_bookings(flight_id)
            .flat_map(|b| b.tickets.iter().filter_map(|t| t.seat_id))
            .collect())
    }

    async fn booked_passenger_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .active_bookings(flight_id)
            .flat_map(|b| b.passenger_ids())
            .collect())
    }

    async fn active_ids_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<&Booking> = tables.active_bookings(flight_id).collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings.into_iter().map(|b| b.id).collect())
    }
}

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> CoreResult<Option<Billing>> {
        Ok(self.tables.read().await.billings.get(&id).cloned())
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Billing>> {
        let tables = self.tables.read().await;
        Ok(tables.billings.values().find(|b| b.booking_id == booking_id).cloned())
    }

    async fn list(&self, filter: &BillingFilter, page: PageRequest) -> CoreResult<Page<Billing>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Billing> = tables
            .billings
            .values()
            .filter(|b| filter.status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (Reverse(a.created_at), Reverse(&a.invoice_number))
                .cmp(&(Reverse(b.created_at), Reverse(&b.invoice_number)))
        });
        Ok(Page::from_vec(items, page))
    }

    async fn pay(&self, id: Uuid, payment: &PayBilling, at: DateTime<Utc>) -> CoreResult<Billing> {
        let mut tables = self.tables.write().await;
        let billing = tables.billings.get(&id).ok_or_else(|| missing("billing", id))?;
        if billing.status != BillingStatus::Unpaid {
            return Err(CoreError::conflict(format!("billing {} is not awaiting payment", id)));
        }
        let booking_id = billing.booking_id;

        let booking = tables
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| missing("booking", booking_id))?;
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::conflict(format!("booking {} is no longer pending", booking_id)));
        }
        booking.status = BookingStatus::Confirmed;
        booking.updated_at = at;

        let billing = tables.billings.get_mut(&id).ok_or_else(|| missing("billing", id))?;
        billing.status = BillingStatus::Paid;
        billing.payment_method = Some(payment.payment_method);
        billing.transaction_ref = payment.transaction_ref.clone();
        billing.paid_at = Some(at);
        billing.updated_at = at;
        Ok(billing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skydesk_core::models::{PaymentMethod, Ticket};

    fn class_flight(flight_id: Uuid, seats: i32) -> ClassFlight {
        let now = Utc::now();
        ClassFlight {
            id: Uuid::new_v4(),
            flight_id,
            seat_class_id: Uuid::new_v4(),
            price_cents: 10_000,
            currency: "USD".to_string(),
            total_seats: seats,
            available_seats: seats,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn open_flight(store: &MemoryStore) -> Uuid {
        let now = Utc::now();
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: format!("VN{:04}", store.next_value("flight:VN").await.unwrap()),
            airline_id: Uuid::new_v4(),
            airplane_id: Uuid::new_v4(),
            origin_airport_id: Uuid::new_v4(),
            destination_airport_id: Uuid::new_v4(),
            departure_time: now + chrono::Duration::days(2),
            arrival_time: now + chrono::Duration::days(2) + chrono::Duration::hours(2),
            status: FlightStatus::Scheduled,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        FlightRepository::insert(store, &flight).await.unwrap();
        flight.id
    }

    fn booking(flight_id: Uuid, number: &str, tickets: &[(Uuid, Uuid, Option<Uuid>)]) -> Booking {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Booking {
            id,
            booking_number: number.to_string(),
            flight_id,
            contact_email: "ops@example.com".to_string(),
            contact_phone: None,
            status: BookingStatus::Pending,
            total_cents: 10_000 * tickets.len() as i64,
            currency: "USD".to_string(),
            tickets: tickets
                .iter()
                .map(|(passenger_id, class_flight_id, seat_id)| Ticket {
                    id: Uuid::new_v4(),
                    booking_id: id,
                    passenger_id: *passenger_id,
                    class_flight_id: *class_flight_id,
                    seat_id: *seat_id,
                    price_cents: 10_000,
                })
                .collect(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_sequence_starts_at_one_per_key() {
        let store = MemoryStore::new();
        assert_eq!(store.next_value("flight:VN").await.unwrap(), 1);
        assert_eq!(store.next_value("flight:VN").await.unwrap(), 2);
        assert_eq!(store.next_value("flight:QH").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_booking_takes_and_returns_seats() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 2);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let seat = Uuid::new_v4();
        let first = booking(
            flight_id,
            "BK2610160001",
            &[(Uuid::new_v4(), economy.id, Some(seat)), (Uuid::new_v4(), economy.id, None)],
        );
        let billing = Billing::for_booking(first.id, &first.booking_number, first.total_cents, "USD");
        store.create(&first, &billing).await.unwrap();

        let left = ClassFlightRepository::find(&store, economy.id).await.unwrap().unwrap();
        assert_eq!(left.available_seats, 0);
        assert_eq!(store.taken_seat_ids(flight_id).await.unwrap(), vec![seat]);

        // Sold out: nothing is written.
        let second = booking(flight_id, "BK2610160002", &[(Uuid::new_v4(), economy.id, None)]);
        let billing2 = Billing::for_booking(second.id, &second.booking_number, 10_000, "USD");
        let err = store.create(&second, &billing2).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(BookingRepository::find(&store, second.id).await.unwrap().is_none());

        let cancelled = store.cancel(first.id, Utc::now()).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        let restored = ClassFlightRepository::find(&store, economy.id).await.unwrap().unwrap();
        assert_eq!(restored.available_seats, 2);
        assert!(store.taken_seat_ids(flight_id).await.unwrap().is_empty());

        let voided = store.find_by_booking(first.id).await.unwrap().unwrap();
        assert_eq!(voided.status, BillingStatus::Void);

        let again = store.cancel(first.id, Utc::now()).await.unwrap_err();
        assert!(matches!(again, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_same_seat_cannot_be_sold_twice() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 10);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let seat = Uuid::new_v4();
        let first = booking(flight_id, "BK2610160001", &[(Uuid::new_v4(), economy.id, Some(seat))]);
        let billing = Billing::for_booking(first.id, &first.booking_number, 10_000, "USD");
        store.create(&first, &billing).await.unwrap();

        let second = booking(flight_id, "BK2610160002", &[(Uuid::new_v4(), economy.id, Some(seat))]);
        let billing2 = Billing::for_booking(second.id, &second.booking_number, 10_000, "USD");
        assert!(matches!(
            store.create(&second, &billing2).await,
            Err(CoreError::Conflict(_))
        ));
        let unchanged = ClassFlightRepository::find(&store, economy.id).await.unwrap().unwrap();
        assert_eq!(unchanged.available_seats, 9);
    }

    #[tokio::test]
    async fn test_pay_confirms_and_cancel_refunds() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 5);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let b = booking(flight_id, "BK2610160001", &[(Uuid::new_v4(), economy.id, None)]);
        let billing = Billing::for_booking(b.id, &b.booking_number, 10_000, "USD");
        store.create(&b, &billing).await.unwrap();

        let payment = PayBilling {
            payment_method: PaymentMethod::Card,
            transaction_ref: Some("TX-1".to_string()),
        };
        let paid = store.pay(billing.id, &payment, Utc::now()).await.unwrap();
        assert_eq!(paid.status, BillingStatus::Paid);
        assert!(paid.paid_at.is_some());
        let confirmed = BookingRepository::find(&store, b.id).await.unwrap().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        assert!(matches!(
            store.pay(billing.id, &payment, Utc::now()).await,
            Err(CoreError::Conflict(_))
        ));

        store.cancel(b.id, Utc::now()).await.unwrap();
        let refunded = BillingRepository::find(&store, billing.id).await.unwrap().unwrap();
        assert_eq!(refunded.status, BillingStatus::Refunded);
        assert!(refunded.refunded_at.is_some());
    }

    #[tokio::test]
    async fn test_class_resize_respects_sold_seats() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 3);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let b = booking(
            flight_id,
            "BK2610160001",
            &[(Uuid::new_v4(), economy.id, None), (Uuid::new_v4(), economy.id, None)],
        );
        let billing = Billing::for_booking(b.id, &b.booking_number, 20_000, "USD");
        store.create(&b, &billing).await.unwrap();

        let mut shrink = economy.clone();
        shrink.total_seats = 1;
        assert!(matches!(
            ClassFlightRepository::update(&store, &shrink).await,
            Err(CoreError::Conflict(_))
        ));

        let mut grow = economy.clone();
        grow.total_seats = 5;
        let grown = ClassFlightRepository::update(&store, &grow).await.unwrap();
        assert_eq!(grown.total_seats, 5);
        assert_eq!(grown.available_seats, 3);
    }

    #[tokio::test]
    async fn test_retiring_a_sold_class_is_refused() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 3);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let b = booking(flight_id, "BK2610160001", &[(Uuid::new_v4(), economy.id, None)]);
        let billing = Billing::for_booking(b.id, &b.booking_number, 10_000, "USD");
        store.create(&b, &billing).await.unwrap();

        let mut retired = economy.clone();
        retired.is_active = false;
        assert!(matches!(
            ClassFlightRepository::update(&store, &retired).await,
            Err(CoreError::Conflict(_))
        ));
        let kept = ClassFlightRepository::find(&store, economy.id).await.unwrap().unwrap();
        assert!(kept.is_active);
    }

    #[tokio::test]
    async fn test_stale_status_write_is_a_conflict() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let stored = FlightRepository::find(&store, flight_id).await.unwrap().unwrap();

        let mut boarding = stored.clone();
        boarding.status = FlightStatus::Boarding;
        FlightRepository::update(&store, &boarding, FlightStatus::Scheduled).await.unwrap();

        // A second writer still holding the SCHEDULED copy loses.
        let mut delayed = stored.clone();
        delayed.status = FlightStatus::Delayed;
        let err = FlightRepository::update(&store, &delayed, FlightStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        let current = FlightRepository::find(&store, flight_id).await.unwrap().unwrap();
        assert_eq!(current.status, FlightStatus::Boarding);
    }

    #[tokio::test]
    async fn test_cancelled_flight_takes_its_bookings_and_stops_selling() {
        let store = MemoryStore::new();
        let flight_id = open_flight(&store).await;
        let economy = class_flight(flight_id, 4);
        ClassFlightRepository::insert(&store, &economy).await.unwrap();

        let mut ids = Vec::new();
        for number in ["BK2610160001", "BK2610160002", "BK2610160003"] {
            let b = booking(flight_id, number, &[(Uuid::new_v4(), economy.id, None)]);
            let billing = Billing::for_booking(b.id, &b.booking_number, 10_000, "USD");
            store.create(&b, &billing).await.unwrap();
            ids.push(b.id);
        }
        store.cancel(ids[0], Utc::now()).await.unwrap();

        let mut cancelled = FlightRepository::find(&store, flight_id).await.unwrap().unwrap();
        cancelled.status = FlightStatus::Cancelled;
        cancelled.updated_at = Utc::now();
        let count = store
            .cancel_with_bookings(&cancelled, FlightStatus::Scheduled)
            .await
            .unwrap();
        assert_eq!(count, 2);

        for id in &ids {
            let b = BookingRepository::find(&store, *id).await.unwrap().unwrap();
            assert_eq!(b.status, BookingStatus::Cancelled);
        }
        let restored = ClassFlightRepository::find(&store, economy.id).await.unwrap().unwrap();
        assert_eq!(restored.available_seats, 4);

        let late = booking(flight_id, "BK2610160004", &[(Uuid::new_v4(), economy.id, None)]);
        let billing = Billing::for_booking(late.id, &late.booking_number, 10_000, "USD");
        assert!(matches!(
            store.create(&late, &billing).await,
            Err(CoreError::Conflict(_))
        ));
    }
}
