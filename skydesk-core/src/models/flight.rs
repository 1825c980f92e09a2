use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Boarding,
    Departed,
    Arrived,
    Cancelled,
}

string_enum!(FlightStatus {
    Scheduled => "SCHEDULED",
    Delayed => "DELAYED",
    Boarding => "BOARDING",
    Departed => "DEPARTED",
    Arrived => "ARRIVED",
    Cancelled => "CANCELLED",
});

impl FlightStatus {
    /// Flights still open for edits, fare classes and new bookings.
    pub fn is_open(&self) -> bool {
        matches!(self, FlightStatus::Scheduled | FlightStatus::Delayed)
    }

    /// Flights that still occupy their airplane's schedule.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            FlightStatus::Scheduled | FlightStatus::Delayed | FlightStatus::Boarding
        )
    }

    pub fn can_transition_to(&self, next: FlightStatus) -> bool {
        use FlightStatus::*;
        matches!(
            (self, next),
            (Scheduled, Delayed)
                | (Scheduled, Boarding)
                | (Scheduled, Cancelled)
                | (Delayed, Scheduled)
                | (Delayed, Boarding)
                | (Delayed, Cancelled)
                | (Boarding, Departed)
                | (Boarding, Cancelled)
                | (Departed, Arrived)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline_id: Uuid,
    pub airplane_id: Uuid,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub status: FlightStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlight {
    pub airline_id: Uuid,
    pub airplane_id: Uuid,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFlight {
    pub airplane_id: Option<Uuid>,
    pub origin_airport_id: Option<Uuid>,
    pub destination_airport_id: Option<Uuid>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFlightStatus {
    pub status: FlightStatus,
}

/// Route and time checks that need no other entity.
pub fn check_route_and_times(
    origin: Uuid,
    destination: Uuid,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
) -> CoreResult<()> {
    if origin == destination {
        return Err(CoreError::validation("origin and destination airports must differ"));
    }
    if arrival <= departure {
        return Err(CoreError::validation("arrival_time must be after departure_time"));
    }
    Ok(())
}

impl Flight {
    pub fn new(req: &CreateFlight, flight_number: String) -> CoreResult<Self> {
        check_route_and_times(
            req.origin_airport_id,
            req.destination_airport_id,
            req.departure_time,
            req.arrival_time,
        )?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            flight_number,
            airline_id: req.airline_id,
            airplane_id: req.airplane_id,
            origin_airport_id: req.origin_airport_id,
            destination_airport_id: req.destination_airport_id,
            departure_time: req.departure_time,
            arrival_time: req.arrival_time,
            status: FlightStatus::Scheduled,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdateFlight) -> CoreResult<()> {
        if let Some(airplane_id) = req.airplane_id {
            self.airplane_id = airplane_id;
        }
        if let Some(origin) = req.origin_airport_id {
            self.origin_airport_id = origin;
        }
        if let Some(destination) = req.destination_airport_id {
            self.destination_airport_id = destination;
        }
        if let Some(departure) = req.departure_time {
            self.departure_time = departure;
        }
        if let Some(arrival) = req.arrival_time {
            self.arrival_time = arrival;
        }
        check_route_and_times(
            self.origin_airport_id,
            self.destination_airport_id,
            self.departure_time,
            self.arrival_time,
        )?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Active, open and not yet departed.
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.status.is_open() && self.departure_time > now
    }
}
