use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

string_enum!(BookingStatus {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Cancelled => "CANCELLED",
});

impl BookingStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub flight_id: Uuid,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub status: BookingStatus,
    pub total_cents: i64,
    pub currency: String,
    pub tickets: Vec<Ticket>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// One passenger's seat in a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub passenger_id: Uuid,
    pub class_flight_id: Uuid,
    pub seat_id: Option<Uuid>,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub flight_id: Uuid,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub passengers: Vec<BookingPassengerRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingPassengerRequest {
    pub passenger_id: Uuid,
    pub class_flight_id: Uuid,
    pub seat_id: Option<Uuid>,
}

impl Booking {
    pub fn passenger_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.tickets.iter().map(|t| t.passenger_id)
    }

    /// Seats requested per class flight.
    pub fn seats_per_class(&self) -> Vec<(Uuid, i32)> {
        let mut counts: Vec<(Uuid, i32)> = Vec::new();
        for ticket in &self.tickets {
            match counts.iter_mut().find(|(id, _)| *id == ticket.class_flight_id) {
                Some((_, n)) => *n += 1,
                None => counts.push((ticket.class_flight_id, 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats_per_class() {
        let economy = Uuid::new_v4();
        let business = Uuid::new_v4();
        let booking_id = Uuid::new_v4();
        let ticket = |class| Ticket {
            id: Uuid::new_v4(),
            booking_id,
            passenger_id: Uuid::new_v4(),
            class_flight_id: class,
            seat_id: None,
            price_cents: 100,
        };
        let now = Utc::now();
        let booking = Booking {
            id: booking_id,
            booking_number: "BK2610150001".to_string(),
            flight_id: Uuid::new_v4(),
            contact_email: "ops@example.com".to_string(),
            contact_phone: None,
            status: BookingStatus::Pending,
            total_cents: 300,
            currency: "USD".to_string(),
            tickets: vec![ticket(economy), ticket(business), ticket(economy)],
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        assert_eq!(booking.seats_per_class(), vec![(economy, 2), (business, 1)]);
        assert_eq!(booking.passenger_ids().count(), 3);
    }
}
