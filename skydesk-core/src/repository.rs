use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_shared::{Page, PageRequest};
use uuid::Uuid;

use crate::models::{
    Airline, Airplane, AirplaneStatus, Airport, Billing, BillingStatus, Booking, BookingStatus,
    ClassFlight, Flight, FlightStatus, PayBilling, Passenger, Seat, SeatClass,
};
use crate::CoreResult;

/// Free-text search plus the soft-delete switch shared by most listings.
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    pub q: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AirplaneFilter {
    pub airline_id: Option<Uuid>,
    pub status: Option<AirplaneStatus>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SeatFilter {
    pub seat_class_id: Option<Uuid>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FlightFilter {
    pub airline_id: Option<Uuid>,
    pub airplane_id: Option<Uuid>,
    pub status: Option<FlightStatus>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub flight_id: Option<Uuid>,
    pub passenger_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct BillingFilter {
    pub status: Option<BillingStatus>,
}

/// Monotonic counters behind flight numbers, booking numbers and registrations.
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// Returns 1 on first use of `key`, then 2, 3, ...
    async fn next_value(&self, key: &str) -> CoreResult<i64>;
}

#[async_trait]
pub trait AirlineRepository: Send + Sync {
    async fn insert(&self, airline: &Airline) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Airline>>;
    async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airline>>;
    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airline>>;
    async fn update(&self, airline: &Airline) -> CoreResult<()>;
}

#[async_trait]
pub trait AirportRepository: Send + Sync {
    async fn insert(&self, airport: &Airport) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Airport>>;
    async fn find_by_iata(&self, iata_code: &str) -> CoreResult<Option<Airport>>;
    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airport>>;
    async fn update(&self, airport: &Airport) -> CoreResult<()>;
}

#[async_trait]
pub trait SeatClassRepository: Send + Sync {
    async fn insert(&self, seat_class: &SeatClass) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<SeatClass>>;
    async fn find_by_code(&self, code: &str) -> CoreResult<Option<SeatClass>>;
    /// Ordered by rank, then code.
    async fn list(&self, include_inactive: bool) -> CoreResult<Vec<SeatClass>>;
    async fn update(&self, seat_class: &SeatClass) -> CoreResult<()>;
}

#[async_trait]
pub trait AirplaneRepository: Send + Sync {
    async fn insert(&self, airplane: &Airplane) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Airplane>>;
    async fn list(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>>;
    async fn update(&self, airplane: &Airplane) -> CoreResult<()>;
    async fn count_active_by_airline(&self, airline_id: Uuid) -> CoreResult<i64>;
}

#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// All-or-nothing insert; a duplicate seat number on the airplane is a conflict.
    async fn insert_many(&self, seats: &[Seat]) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Seat>>;
    /// Ordered by row, then letter.
    async fn list_by_airplane(&self, airplane_id: Uuid, filter: &SeatFilter) -> CoreResult<Vec<Seat>>;
    async fn update(&self, seat: &Seat) -> CoreResult<()>;
    async fn count_active(&self, airplane_id: Uuid, seat_class_id: Uuid) -> CoreResult<i64>;
}

#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn insert(&self, flight: &Flight) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Flight>>;
    /// Ordered by departure time.
    async fn list(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>>;
    /// Saves the flight only if its stored status is still `expected`; a flight
    /// that moved on in the meantime is a conflict.
    async fn update(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<()>;
    /// Stores the cancelled flight and cancels every active booking on it in one
    /// unit, guarded like `update`. Returns how many bookings were cancelled.
    async fn cancel_with_bookings(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<usize>;
    /// Active, not yet departed flights of the airplane touching `[from, to)`.
    async fn list_for_airplane(
        &self,
        airplane_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>>;
    /// Active open flights on the route departing within `[from, to)`.
    async fn search(
        &self,
        origin_airport_id: Uuid,
        destination_airport_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>>;
    async fn count_pending_by_airplane(&self, airplane_id: Uuid) -> CoreResult<i64>;
}

#[async_trait]
pub trait ClassFlightRepository: Send + Sync {
    async fn insert(&self, class_flight: &ClassFlight) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<ClassFlight>>;
    async fn find_by_flight_and_class(
        &self,
        flight_id: Uuid,
        seat_class_id: Uuid,
    ) -> CoreResult<Option<ClassFlight>>;
    async fn list_by_flight(&self, flight_id: Uuid) -> CoreResult<Vec<ClassFlight>>;
    /// Saves price, total and activity. The seat pool is resized relative to the
    /// stored sold count; fails with a conflict if it would drop below it or if
    /// a class with sold seats would be deactivated.
    async fn update(&self, class_flight: &ClassFlight) -> CoreResult<ClassFlight>;
}

#[async_trait]
pub trait PassengerRepository: Send + Sync {
    async fn insert(&self, passenger: &Passenger) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Passenger>>;
    async fn find_by_passport(&self, passport_number: &str) -> CoreResult<Option<Passenger>>;
    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Passenger>>;
    async fn update(&self, passenger: &Passenger) -> CoreResult<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Takes seats from each class flight, then stores booking, tickets and billing
    /// in one unit. A flight no longer open for sale, too few seats, a taken seat
    /// or a passenger already on the flight is a conflict and nothing is written.
    async fn create(&self, booking: &Booking, billing: &Billing) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>>;
    async fn find_by_number(&self, booking_number: &str) -> CoreResult<Option<Booking>>;
    /// Newest first.
    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> CoreResult<Page<Booking>>;
    /// Cancels an active booking, returns its seats and settles the billing.
    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> CoreResult<Booking>;
    async fn taken_seat_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>>;
    async fn booked_passenger_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>>;
    async fn active_ids_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>>;
}

#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> CoreResult<Option<Billing>>;
    async fn find_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Billing>>;
    /// Newest first.
    async fn list(&self, filter: &BillingFilter, page: PageRequest) -> CoreResult<Page<Billing>>;
    /// Marks an unpaid billing paid and confirms its pending booking together.
    async fn pay(&self, id: Uuid, payment: &PayBilling, at: DateTime<Utc>) -> CoreResult<Billing>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub sequences: Arc<dyn SequenceRepository>,
    pub airlines: Arc<dyn AirlineRepository>,
    pub airports: Arc<dyn AirportRepository>,
    pub seat_classes: Arc<dyn SeatClassRepository>,
    pub airplanes: Arc<dyn AirplaneRepository>,
    pub seats: Arc<dyn SeatRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub class_flights: Arc<dyn ClassFlightRepository>,
    pub passengers: Arc<dyn PassengerRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub billings: Arc<dyn BillingRepository>,
}

impl Repositories {
    /// Wires every repository to one backend implementing them all.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: SequenceRepository
            + AirlineRepository
            + AirportRepository
            + SeatClassRepository
            + AirplaneRepository
            + SeatRepository
            + FlightRepository
            + ClassFlightRepository
            + PassengerRepository
            + BookingRepository
            + BillingRepository
            + 'static,
    {
        Self {
            sequences: backend.clone(),
            airlines: backend.clone(),
            airports: backend.clone(),
            seat_classes: backend.clone(),
            airplanes: backend.clone(),
            seats: backend.clone(),
            flights: backend.clone(),
            class_flights: backend.clone(),
            passengers: backend.clone(),
            bookings: backend.clone(),
            billings: backend,
        }
    }
}
