pub mod airline;
pub mod airport;
pub mod booking;
pub mod fleet;
pub mod flight;
pub mod passenger;
pub mod seat_class;

use std::sync::Arc;

pub use airline::AirlineService;
pub use airport::AirportService;
pub use booking::BookingService;
pub use fleet::FleetService;
pub use flight::{ClassFlightView, FlightOffer, FlightService, SeatAvailability};
pub use passenger::PassengerService;
pub use seat_class::SeatClassService;

use crate::{BusinessRules, CoreError, CoreResult, Repositories};

/// Unwraps a repository lookup or reports the entity as missing.
pub(crate) fn found<T>(value: Option<T>, entity: &'static str, id: impl ToString) -> CoreResult<T> {
    value.ok_or_else(|| CoreError::not_found(entity, id))
}

/// All application services over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub airlines: AirlineService,
    pub airports: AirportService,
    pub seat_classes: SeatClassService,
    pub fleet: FleetService,
    pub flights: FlightService,
    pub passengers: PassengerService,
    pub bookings: BookingService,
    pub rules: Arc<BusinessRules>,
}

impl Services {
    pub fn new(repos: Repositories, rules: BusinessRules) -> Self {
        let rules = Arc::new(rules);
        Self {
            airlines: AirlineService::new(repos.clone()),
            airports: AirportService::new(repos.clone()),
            seat_classes: SeatClassService::new(repos.clone()),
            fleet: FleetService::new(repos.clone()),
            flights: FlightService::new(repos.clone(), rules.clone()),
            passengers: PassengerService::new(repos.clone()),
            bookings: BookingService::new(repos, rules.clone()),
            rules,
        }
    }
}
