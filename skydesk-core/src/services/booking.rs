use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use skydesk_shared::{Page, PageRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::found;
use crate::models::passenger::normalize_email;
use crate::models::{
    Billing, BillingStatus, Booking, BookingStatus, ClassFlight, CreateBooking, FlightStatus,
    PayBilling, Ticket,
};
use crate::repository::{BillingFilter, BookingFilter};
use crate::{numbering, BusinessRules, CoreError, CoreResult, Repositories};

/// Bookings and the billing record that travels with each of them.
#[derive(Clone)]
pub struct BookingService {
    repos: Repositories,
    rules: Arc<BusinessRules>,
}

impl BookingService {
    pub fn new(repos: Repositories, rules: Arc<BusinessRules>) -> Self {
        Self { repos, rules }
    }

    pub async fn create(&self, req: &CreateBooking) -> CoreResult<Booking> {
        let party = req.passengers.len();
        if party == 0 {
            return Err(CoreError::validation("a booking needs at least one passenger"));
        }
        if party > self.rules.max_passengers_per_booking {
            return Err(CoreError::validation(format!(
                "a booking may hold at most {} passengers",
                self.rules.max_passengers_per_booking
            )));
        }
        let contact_email = normalize_email(&req.contact_email)?;
        let contact_phone = crate::models::optional(req.contact_phone.as_deref());

        let now = Utc::now();
        let flight = found(self.repos.flights.find(req.flight_id).await?, "Flight", req.flight_id)?;
        if !flight.is_bookable(now) {
            return Err(CoreError::validation(format!(
                "flight {} is not open for booking",
                flight.flight_number
            )));
        }

        // Passengers: distinct, active, not already flying on this flight.
        let mut seen = HashSet::new();
        for entry in &req.passengers {
            if !seen.insert(entry.passenger_id) {
                return Err(CoreError::validation(format!(
                    "passenger {} is listed twice",
                    entry.passenger_id
                )));
            }
            let passenger = found(
                self.repos.passengers.find(entry.passenger_id).await?,
                "Passenger",
                entry.passenger_id,
            )?;
            if !passenger.is_active {
                return Err(CoreError::validation(format!(
                    "passenger {} is inactive",
                    passenger.full_name()
                )));
            }
        }
        let booked = self.repos.bookings.booked_passenger_ids(flight.id).await?;
        if let Some(dup) = req.passengers.iter().find(|p| booked.contains(&p.passenger_id)) {
            return Err(CoreError::conflict(format!(
                "passenger {} is already booked on flight {}",
                dup.passenger_id, flight.flight_number
            )));
        }

        // Fare classes: must be sold on this flight, with enough seats left.
        let mut classes: HashMap<Uuid, ClassFlight> = HashMap::new();
        let mut wanted: HashMap<Uuid, i32> = HashMap::new();
        for entry in &req.passengers {
            if !classes.contains_key(&entry.class_flight_id) {
                let class_flight = found(
                    self.repos.class_flights.find(entry.class_flight_id).await?,
                    "Class flight",
                    entry.class_flight_id,
                )?;
                if class_flight.flight_id != flight.id || !class_flight.is_active {
                    return Err(CoreError::validation(format!(
                        "class flight {} is not sold on flight {}",
                        class_flight.id, flight.flight_number
                    )));
                }
                classes.insert(class_flight.id, class_flight);
            }
            *wanted.entry(entry.class_flight_id).or_default() += 1;
        }
        for (class_id, count) in &wanted {
            let available = classes[class_id].available_seats;
            if available < *count {
                return Err(CoreError::conflict(format!(
                    "only {} seats left in class flight {}",
                    available, class_id
                )));
            }
        }

        // Seats: optional, but each must be a free seat of the right cabin.
        let taken = self.repos.bookings.taken_seat_ids(flight.id).await?;
        let mut chosen = HashSet::new();
        for entry in &req.passengers {
            let Some(seat_id) = entry.seat_id else { continue };
            if !chosen.insert(seat_id) {
                return Err(CoreError::validation(format!("seat {} is requested twice", seat_id)));
            }
            let seat = found(self.repos.seats.find(seat_id).await?, "Seat", seat_id)?;
            let class_flight = &classes[&entry.class_flight_id];
            if seat.airplane_id != flight.airplane_id || !seat.is_active {
                return Err(CoreError::validation(format!(
                    "seat {} is not on flight {}",
                    seat.seat_number, flight.flight_number
                )));
            }
            if seat.seat_class_id != class_flight.seat_class_id {
                return Err(CoreError::validation(format!(
                    "seat {} does not belong to the booked class",
                    seat.seat_number
                )));
            }
            if taken.contains(&seat_id) {
                return Err(CoreError::conflict(format!("seat {} is already taken", seat.seat_number)));
            }
        }

        let seq = self
            .repos
            .sequences
            .next_value(&numbering::booking_sequence_key(now))
            .await?;
        let booking_id = Uuid::new_v4();
        let tickets: Vec<Ticket> = req
            .passengers
            .iter()
            .map(|entry| Ticket {
                id: Uuid::new_v4(),
                booking_id,
                passenger_id: entry.passenger_id,
                class_flight_id: entry.class_flight_id,
                seat_id: entry.seat_id,
                price_cents: classes[&entry.class_flight_id].price_cents,
            })
            .collect();
        let total_cents = tickets.iter().map(|t| t.price_cents).sum();

        let booking = Booking {
            id: booking_id,
            booking_number: numbering::booking_number(now, seq),
            flight_id: flight.id,
            contact_email,
            contact_phone,
            status: BookingStatus::Pending,
            total_cents,
            currency: self.rules.currency.clone(),
            tickets,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        let billing = Billing::for_booking(booking.id, &booking.booking_number, total_cents, &booking.currency);

        self.repos.bookings.create(&booking, &billing).await?;
        info!(
            booking_number = %booking.booking_number,
            flight_number = %flight.flight_number,
            passengers = party,
            total_cents,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Booking> {
        found(self.repos.bookings.find(id).await?, "Booking", id)
    }

    pub async fn get_by_number(&self, booking_number: &str) -> CoreResult<Booking> {
        let number = booking_number.trim().to_ascii_uppercase();
        found(self.repos.bookings.find_by_number(&number).await?, "Booking", number)
    }

    pub async fn list(&self, filter: &BookingFilter, page: PageRequest) -> CoreResult<Page<Booking>> {
        self.repos.bookings.list(filter, page).await
    }

    pub async fn cancel(&self, id: Uuid) -> CoreResult<Booking> {
        let booking = self.get(id).await?;
        if !booking.status.is_active() {
            return Err(CoreError::conflict(format!(
                "booking {} is already cancelled",
                booking.booking_number
            )));
        }
        let flight = self.repos.flights.find(booking.flight_id).await?;
        if let Some(flight) = flight {
            if matches!(flight.status, FlightStatus::Departed | FlightStatus::Arrived) {
                return Err(CoreError::validation(format!(
                    "flight {} has already departed",
                    flight.flight_number
                )));
            }
        }

        let cancelled = self.repos.bookings.cancel(id, Utc::now()).await?;
        info!(booking_number = %cancelled.booking_number, "Booking cancelled");
        Ok(cancelled)
    }

    pub async fn get_billing(&self, id: Uuid) -> CoreResult<Billing> {
        found(self.repos.billings.find(id).await?, "Billing", id)
    }

    pub async fn billing_for_booking(&self, booking_id: Uuid) -> CoreResult<Billing> {
        self.get(booking_id).await?;
        found(self.repos.billings.find_by_booking(booking_id).await?, "Billing", booking_id)
    }

    pub async fn list_billings(&self, filter: &BillingFilter, page: PageRequest) -> CoreResult<Page<Billing>> {
        self.repos.billings.list(filter, page).await
    }

    /// Records payment and confirms the booking.
    pub async fn pay(&self, billing_id: Uuid, req: &PayBilling) -> CoreResult<Billing> {
        let billing = self.get_billing(billing_id).await?;
        if billing.status != BillingStatus::Unpaid {
            warn!(invoice = %billing.invoice_number, status = %billing.status, "Payment rejected");
            return Err(CoreError::conflict(format!(
                "invoice {} is {}",
                billing.invoice_number, billing.status
            )));
        }
        let booking = self.get(billing.booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::conflict(format!(
                "booking {} is {}",
                booking.booking_number, booking.status
            )));
        }

        let payment = PayBilling {
            payment_method: req.payment_method,
            transaction_ref: crate::models::optional(req.transaction_ref.as_deref()),
        };
        let paid = self.repos.billings.pay(billing_id, &payment, Utc::now()).await?;
        info!(
            invoice = %paid.invoice_number,
            booking_number = %booking.booking_number,
            method = %payment.payment_method,
            "Billing paid, booking confirmed"
        );
        Ok(paid)
    }
}
