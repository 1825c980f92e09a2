use chrono::{DateTime, Duration, NaiveDate, Utc};
use skydesk_core::models::{
    Airline, Airplane, Airport, BillingStatus, Booking, BookingPassengerRequest, BookingStatus,
    CreateAirline, CreateAirplane, CreateAirport, CreateBooking, CreateClassFlight, CreateFlight,
    CreatePassenger, CreateSeatClass, Flight, FlightStatus, GenerateSeatLayout, PayBilling,
    PaymentMethod, SeatClass, UpdateAirline, UpdateAirplane, UpdateClassFlight, UpdateFlight,
};
use skydesk_core::repository::{BookingFilter, SeatFilter, TextFilter};
use skydesk_core::services::ClassFlightView;
use skydesk_core::{BusinessRules, CoreError, Services};
use skydesk_shared::PageRequest;

struct Fixture {
    services: Services,
    airline: Airline,
    airplane: Airplane,
    origin: Airport,
    destination: Airport,
    economy: SeatClass,
}

fn departure_day() -> NaiveDate {
    (Utc::now() + Duration::days(3)).date_naive()
}

fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
    day.and_hms_opt(hour, 0, 0).unwrap().and_utc()
}

async fn fixture() -> Fixture {
    fixture_with(BusinessRules::default()).await
}

async fn fixture_with(rules: BusinessRules) -> Fixture {
    let services = Services::new(skydesk_store::memory_repositories(), rules);

    let airline = services
        .airlines
        .create(&CreateAirline {
            code: "vn".to_string(),
            name: "Vietnam Airlines".to_string(),
            country: "Vietnam".to_string(),
        })
        .await
        .unwrap();
    let origin = services
        .airports
        .create(&CreateAirport {
            iata_code: "SGN".to_string(),
            name: "Tan Son Nhat".to_string(),
            city: "Ho Chi Minh City".to_string(),
            country: "Vietnam".to_string(),
            timezone: Some("Asia/Ho_Chi_Minh".to_string()),
        })
        .await
        .unwrap();
    let destination = services
        .airports
        .create(&CreateAirport {
            iata_code: "HAN".to_string(),
            name: "Noi Bai".to_string(),
            city: "Hanoi".to_string(),
            country: "Vietnam".to_string(),
            timezone: None,
        })
        .await
        .unwrap();
    let economy = services
        .seat_classes
        .create(&CreateSeatClass {
            code: "ECONOMY".to_string(),
            name: "Economy".to_string(),
            description: None,
            rank: 3,
        })
        .await
        .unwrap();
    let airplane = services
        .fleet
        .create_airplane(&CreateAirplane {
            airline_id: airline.id,
            model: "A321".to_string(),
            manufacturer: "Airbus".to_string(),
            year_built: Some(2018),
        })
        .await
        .unwrap();
    services
        .fleet
        .generate_layout(
            airplane.id,
            &GenerateSeatLayout {
                seat_class_id: economy.id,
                first_row: 10,
                last_row: 11,
                layout: "ABC-DEF".to_string(),
            },
        )
        .await
        .unwrap();

    Fixture {
        services,
        airline,
        airplane,
        origin,
        destination,
        economy,
    }
}

impl Fixture {
    async fn schedule(&self, departure: DateTime<Utc>) -> Result<Flight, CoreError> {
        self.services
            .flights
            .create(&CreateFlight {
                airline_id: self.airline.id,
                airplane_id: self.airplane.id,
                origin_airport_id: self.origin.id,
                destination_airport_id: self.destination.id,
                departure_time: departure,
                arrival_time: departure + Duration::hours(2),
            })
            .await
    }

    async fn open_economy(&self, flight: &Flight, seats: Option<i32>) -> ClassFlightView {
        self.services
            .flights
            .create_class(&CreateClassFlight {
                flight_id: flight.id,
                seat_class_id: self.economy.id,
                price_cents: 125_000,
                total_seats: seats,
            })
            .await
            .unwrap()
    }

    async fn passenger(&self, first_name: &str, passport: &str) -> uuid::Uuid {
        self.services
            .passengers
            .create(&CreatePassenger {
                first_name: first_name.to_string(),
                last_name: "Nguyen".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
                phone: None,
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
                nationality: Some("VN".to_string()),
                passport_number: Some(passport.to_string().into()),
            })
            .await
            .unwrap()
            .id
    }

    async fn book_one(
        &self,
        flight: &Flight,
        class_flight_id: uuid::Uuid,
        passenger: uuid::Uuid,
    ) -> Result<Booking, CoreError> {
        self.services
            .bookings
            .create(&booking_for(
                flight,
                vec![BookingPassengerRequest {
                    passenger_id: passenger,
                    class_flight_id,
                    seat_id: None,
                }],
            ))
            .await
    }
}

fn booking_for(flight: &Flight, passengers: Vec<BookingPassengerRequest>) -> CreateBooking {
    CreateBooking {
        flight_id: flight.id,
        contact_email: "Contact@Example.com".to_string(),
        contact_phone: None,
        passengers,
    }
}

#[tokio::test]
async fn test_reference_data_codes_are_unique() {
    let fx = fixture().await;
    assert_eq!(fx.airline.code, "VN");

    let err = fx
        .services
        .airlines
        .create(&CreateAirline {
            code: "VN".to_string(),
            name: "Another".to_string(),
            country: "Vietnam".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let err = fx
        .services
        .airports
        .create(&CreateAirport {
            iata_code: "sgn".to_string(),
            name: "Duplicate".to_string(),
            city: "Ho Chi Minh City".to_string(),
            country: "Vietnam".to_string(),
            timezone: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let found = fx.services.airports.get_by_iata("han").await.unwrap();
    assert_eq!(found.id, fx.destination.id);
}

#[tokio::test]
async fn test_airplane_registration_and_layout() {
    let fx = fixture().await;
    assert_eq!(fx.airplane.registration_code, "VN-0001");

    let second = fx
        .services
        .fleet
        .create_airplane(&CreateAirplane {
            airline_id: fx.airline.id,
            model: "787-9".to_string(),
            manufacturer: "Boeing".to_string(),
            year_built: None,
        })
        .await
        .unwrap();
    assert_eq!(second.registration_code, "VN-0002");

    let seats = fx
        .services
        .fleet
        .list_seats(fx.airplane.id, &SeatFilter::default())
        .await
        .unwrap();
    assert_eq!(seats.len(), 12);
    assert_eq!(seats[0].seat_number, "10A");

    // Regenerating the same rows collides with existing seat numbers.
    let err = fx
        .services
        .fleet
        .generate_layout(
            fx.airplane.id,
            &GenerateSeatLayout {
                seat_class_id: fx.economy.id,
                first_row: 11,
                last_row: 12,
                layout: "AB".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_flight_numbers_and_turnaround_overlap() {
    let fx = fixture().await;
    let day = departure_day();

    let first = fx.schedule(at(day, 8)).await.unwrap();
    assert_eq!(first.flight_number, "VN0001");
    assert_eq!(first.status, FlightStatus::Scheduled);

    // Lands at 10:00; 10:15 is inside the 30 minute turnaround.
    let err = fx.schedule(at(day, 10) + Duration::minutes(15)).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let second = fx.schedule(at(day, 11)).await.unwrap();
    assert_eq!(second.flight_number, "VN0002");

    let err = fx.schedule(Utc::now() - Duration::hours(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_class_capacity_follows_the_cabin() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();

    let view = fx.open_economy(&flight, None).await;
    assert_eq!(view.seat_class_code, "ECONOMY");
    assert_eq!(view.class_flight.total_seats, 12);
    assert_eq!(view.class_flight.available_seats, 12);

    let err = fx
        .services
        .flights
        .create_class(&CreateClassFlight {
            flight_id: flight.id,
            seat_class_id: fx.economy.id,
            price_cents: 1,
            total_seats: Some(1),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let err = fx
        .services
        .flights
        .update_class(
            view.class_flight.id,
            &UpdateClassFlight {
                total_seats: Some(13),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let resized = fx
        .services
        .flights
        .update_class(
            view.class_flight.id,
            &UpdateClassFlight {
                total_seats: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(resized.class_flight.available_seats, 6);
}

#[tokio::test]
async fn test_search_lists_open_flights_with_room() {
    let fx = fixture().await;
    let day = departure_day();
    let flight = fx.schedule(at(day, 8)).await.unwrap();
    fx.open_economy(&flight, Some(2)).await;
    // No fare classes: never offered.
    fx.schedule(at(day, 14)).await.unwrap();

    let offers = fx.services.flights.search("sgn", "HAN", day, 1).await.unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].flight.id, flight.id);
    assert_eq!(offers[0].origin_iata, "SGN");
    assert_eq!(offers[0].classes.len(), 1);

    let offers = fx.services.flights.search("SGN", "HAN", day, 3).await.unwrap();
    assert!(offers.is_empty());

    let offers = fx
        .services
        .flights
        .search("SGN", "HAN", day + Duration::days(1), 1)
        .await
        .unwrap();
    assert!(offers.is_empty());

    let err = fx.services.flights.search("XXX", "HAN", day, 1).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;
    let seat = fx.services.flights.seat_map(flight.id).await.unwrap()[0].seat.clone();

    let an = fx.passenger("An", "B1234567").await;
    let binh = fx.passenger("Binh", "C7654321").await;

    let booking = fx
        .services
        .bookings
        .create(&booking_for(
            &flight,
            vec![
                BookingPassengerRequest {
                    passenger_id: an,
                    class_flight_id: class.id,
                    seat_id: Some(seat.id),
                },
                BookingPassengerRequest {
                    passenger_id: binh,
                    class_flight_id: class.id,
                    seat_id: None,
                },
            ],
        ))
        .await
        .unwrap();
    assert!(booking.booking_number.starts_with("BK"));
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_cents, 250_000);
    assert_eq!(booking.contact_email, "contact@example.com");
    assert_eq!(booking.tickets.len(), 2);

    let class_after = fx.services.flights.get_class(class.id).await.unwrap();
    assert_eq!(class_after.class_flight.available_seats, 10);

    let seat_map = fx.services.flights.seat_map(flight.id).await.unwrap();
    assert!(!seat_map.iter().find(|s| s.seat.id == seat.id).unwrap().available);

    let by_number = fx
        .services
        .bookings
        .get_by_number(&booking.booking_number.to_lowercase())
        .await
        .unwrap();
    assert_eq!(by_number.id, booking.id);

    let billing = fx.services.bookings.billing_for_booking(booking.id).await.unwrap();
    assert_eq!(billing.status, BillingStatus::Unpaid);
    assert_eq!(billing.amount_cents, 250_000);
    assert_eq!(billing.invoice_number, format!("INV-{}", booking.booking_number));

    let paid = fx
        .services
        .bookings
        .pay(
            billing.id,
            &PayBilling {
                payment_method: PaymentMethod::Card,
                transaction_ref: Some("  TX-42 ".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, BillingStatus::Paid);
    assert_eq!(paid.transaction_ref.as_deref(), Some("TX-42"));
    assert!(paid.paid_at.is_some());
    let confirmed = fx.services.bookings.get(booking.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let err = fx
        .services
        .bookings
        .pay(
            billing.id,
            &PayBilling {
                payment_method: PaymentMethod::Cash,
                transaction_ref: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let cancelled = fx.services.bookings.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    let refunded = fx.services.bookings.get_billing(billing.id).await.unwrap();
    assert_eq!(refunded.status, BillingStatus::Refunded);

    let class_after = fx.services.flights.get_class(class.id).await.unwrap();
    assert_eq!(class_after.class_flight.available_seats, 12);

    let err = fx.services.bookings.cancel(booking.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_seats_and_passengers_cannot_be_double_booked() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;
    let seat = fx.services.flights.seat_map(flight.id).await.unwrap()[0].seat.clone();
    let an = fx.passenger("An", "B1234567").await;
    let binh = fx.passenger("Binh", "C7654321").await;

    fx.services
        .bookings
        .create(&booking_for(
            &flight,
            vec![BookingPassengerRequest {
                passenger_id: an,
                class_flight_id: class.id,
                seat_id: Some(seat.id),
            }],
        ))
        .await
        .unwrap();

    let err = fx
        .services
        .bookings
        .create(&booking_for(
            &flight,
            vec![BookingPassengerRequest {
                passenger_id: binh,
                class_flight_id: class.id,
                seat_id: Some(seat.id),
            }],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let err = fx
        .services
        .bookings
        .create(&booking_for(
            &flight,
            vec![BookingPassengerRequest {
                passenger_id: an,
                class_flight_id: class.id,
                seat_id: None,
            }],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let err = fx
        .services
        .bookings
        .create(&booking_for(&flight, Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_cancelling_a_flight_cancels_its_bookings() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;
    let an = fx.passenger("An", "B1234567").await;

    let booking = fx
        .services
        .bookings
        .create(&booking_for(
            &flight,
            vec![BookingPassengerRequest {
                passenger_id: an,
                class_flight_id: class.id,
                seat_id: None,
            }],
        ))
        .await
        .unwrap();

    let err = fx.services.flights.delete(flight.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let cancelled = fx
        .services
        .flights
        .change_status(flight.id, FlightStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, FlightStatus::Cancelled);

    let booking = fx.services.bookings.get(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    let billing = fx.services.bookings.billing_for_booking(booking.id).await.unwrap();
    assert_eq!(billing.status, BillingStatus::Void);

    let err = fx
        .services
        .flights
        .change_status(flight.id, FlightStatus::Scheduled)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let page = fx
        .services
        .bookings
        .list(
            &BookingFilter {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
}

#[tokio::test]
async fn test_deactivation_guards() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();

    let err = fx.services.airlines.delete(fx.airline.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let err = fx.services.fleet.delete_airplane(fx.airplane.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    fx.services.flights.delete(flight.id).await.unwrap();
    fx.services.fleet.delete_airplane(fx.airplane.id).await.unwrap();
    let airline = fx.services.airlines.delete(fx.airline.id).await.unwrap();
    assert!(!airline.is_active);

    let listed = fx
        .services
        .airlines
        .list(&TextFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(listed.items.is_empty());
}

#[tokio::test]
async fn test_deactivating_by_update_runs_the_same_guards() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;
    let an = fx.passenger("An", "B1234567").await;
    fx.book_one(&flight, class.id, an).await.unwrap();

    let retire = UpdateAirline {
        is_active: Some(false),
        ..Default::default()
    };
    let err = fx.services.airlines.update(fx.airline.id, &retire).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(fx.services.airlines.get(fx.airline.id).await.unwrap().is_active);

    let retire = UpdateAirplane {
        is_active: Some(false),
        ..Default::default()
    };
    let err = fx
        .services
        .fleet
        .update_airplane(fx.airplane.id, &retire)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(fx.services.fleet.get_airplane(fx.airplane.id).await.unwrap().is_active);

    let retire = UpdateClassFlight {
        is_active: Some(false),
        ..Default::default()
    };
    let err = fx.services.flights.update_class(class.id, &retire).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    let err = fx.services.flights.delete_class(class.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(fx.services.flights.get_class(class.id).await.unwrap().class_flight.is_active);

    // Renaming is still fine.
    let renamed = fx
        .services
        .airlines
        .update(
            fx.airline.id,
            &UpdateAirline {
                name: Some("Vietnam Airlines JSC".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Vietnam Airlines JSC");
}

#[tokio::test]
async fn test_search_party_is_capped() {
    let fx = fixture().await;
    let day = departure_day();
    let flight = fx.schedule(at(day, 8)).await.unwrap();
    fx.open_economy(&flight, Some(2)).await;

    for passengers in [10, 3_000_000_000, u32::MAX] {
        let err = fx
            .services
            .flights
            .search("SGN", "HAN", day, passengers)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)), "{}", passengers);
    }

    let offers = fx.services.flights.search("SGN", "HAN", day, 0).await.unwrap();
    assert_eq!(offers.len(), 1);
    let offers = fx.services.flights.search("SGN", "HAN", day, 3).await.unwrap();
    assert!(offers.is_empty());
}

#[tokio::test]
async fn test_flight_cancel_reaches_every_remaining_booking() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;

    let an = fx.passenger("An", "B1234567").await;
    let binh = fx.passenger("Binh", "C7654321").await;
    let chi = fx.passenger("Chi", "D1122334").await;
    let first = fx.book_one(&flight, class.id, an).await.unwrap();
    let second = fx.book_one(&flight, class.id, binh).await.unwrap();
    let third = fx.book_one(&flight, class.id, chi).await.unwrap();

    fx.services.bookings.cancel(first.id).await.unwrap();
    let billing = fx.services.bookings.billing_for_booking(second.id).await.unwrap();
    fx.services
        .bookings
        .pay(
            billing.id,
            &PayBilling {
                payment_method: PaymentMethod::Card,
                transaction_ref: None,
            },
        )
        .await
        .unwrap();

    fx.services
        .flights
        .change_status(flight.id, FlightStatus::Cancelled)
        .await
        .unwrap();

    for id in [first.id, second.id, third.id] {
        let booking = fx.services.bookings.get(id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }
    let refunded = fx.services.bookings.billing_for_booking(second.id).await.unwrap();
    assert_eq!(refunded.status, BillingStatus::Refunded);
    let voided = fx.services.bookings.billing_for_booking(third.id).await.unwrap();
    assert_eq!(voided.status, BillingStatus::Void);
    let class_after = fx.services.flights.get_class(class.id).await.unwrap();
    assert_eq!(class_after.class_flight.available_seats, 12);

    let dung = fx.passenger("Dung", "E5566778").await;
    let err = fx.book_one(&flight, class.id, dung).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_reschedule_rules() {
    let fx = fixture().await;
    let day = departure_day();
    let morning = fx.schedule(at(day, 8)).await.unwrap();
    let afternoon = fx.schedule(at(day, 14)).await.unwrap();

    // Overlaps only its own old slot.
    let moved = fx
        .services
        .flights
        .update(
            morning.id,
            &UpdateFlight {
                departure_time: Some(at(day, 9)),
                arrival_time: Some(at(day, 11)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.departure_time, at(day, 9));

    // The afternoon flight lands at 16:00; 16:15 is inside its turnaround.
    let err = fx
        .services
        .flights
        .update(
            morning.id,
            &UpdateFlight {
                departure_time: Some(at(day, 16) + Duration::minutes(15)),
                arrival_time: Some(at(day, 18)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(fx.services.flights.get(morning.id).await.unwrap().departure_time, at(day, 9));

    fx.services
        .flights
        .change_status(afternoon.id, FlightStatus::Boarding)
        .await
        .unwrap();
    let err = fx
        .services
        .flights
        .update(
            afternoon.id,
            &UpdateFlight {
                departure_time: Some(at(day, 15)),
                arrival_time: Some(at(day, 17)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_airplane_swap_is_refused_once_booked() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;
    let spare = fx
        .services
        .fleet
        .create_airplane(&CreateAirplane {
            airline_id: fx.airline.id,
            model: "A350".to_string(),
            manufacturer: "Airbus".to_string(),
            year_built: Some(2020),
        })
        .await
        .unwrap();
    let swap = UpdateFlight {
        airplane_id: Some(spare.id),
        ..Default::default()
    };

    let an = fx.passenger("An", "B1234567").await;
    let booking = fx.book_one(&flight, class.id, an).await.unwrap();
    let err = fx.services.flights.update(flight.id, &swap).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(fx.services.flights.get(flight.id).await.unwrap().airplane_id, fx.airplane.id);

    fx.services.bookings.cancel(booking.id).await.unwrap();
    let swapped = fx.services.flights.update(flight.id, &swap).await.unwrap();
    assert_eq!(swapped.airplane_id, spare.id);
}

#[tokio::test]
async fn test_booking_party_limit() {
    let fx = fixture().await;
    let flight = fx.schedule(at(departure_day(), 8)).await.unwrap();
    let class = fx.open_economy(&flight, None).await.class_flight;

    let party: Vec<BookingPassengerRequest> = (0..10)
        .map(|_| BookingPassengerRequest {
            passenger_id: uuid::Uuid::new_v4(),
            class_flight_id: class.id,
            seat_id: None,
        })
        .collect();
    let err = fx
        .services
        .bookings
        .create(&booking_for(&flight, party))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    let untouched = fx.services.flights.get_class(class.id).await.unwrap();
    assert_eq!(untouched.class_flight.available_seats, 12);
}

#[tokio::test]
async fn test_departure_lead_time() {
    let fx = fixture_with(BusinessRules {
        min_departure_lead_minutes: 120,
        ..Default::default()
    })
    .await;

    let err = fx.schedule(Utc::now() + Duration::hours(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let flight = fx.schedule(Utc::now() + Duration::hours(3)).await.unwrap();
    let err = fx
        .services
        .flights
        .update(
            flight.id,
            &UpdateFlight {
                departure_time: Some(Utc::now() + Duration::minutes(90)),
                arrival_time: Some(Utc::now() + Duration::hours(3)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
