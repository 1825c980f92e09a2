pub mod airline;
pub mod airplane;
pub mod airport;
pub mod billing;
pub mod booking;
pub mod class_flight;
pub mod flight;
pub mod passenger;
pub mod seat;
pub mod seat_class;

pub use airline::{Airline, CreateAirline, UpdateAirline};
pub use airplane::{Airplane, AirplaneStatus, CreateAirplane, UpdateAirplane};
pub use airport::{Airport, CreateAirport, UpdateAirport};
pub use billing::{Billing, BillingStatus, PayBilling, PaymentMethod};
pub use booking::{Booking, BookingPassengerRequest, BookingStatus, CreateBooking, Ticket};
pub use class_flight::{ClassFlight, CreateClassFlight, UpdateClassFlight};
pub use flight::{CreateFlight, Flight, FlightStatus, UpdateFlight, UpdateFlightStatus};
pub use passenger::{CreatePassenger, Passenger, UpdatePassenger};
pub use seat::{CreateSeat, GenerateSeatLayout, Seat, SeatPosition, UpdateSeat};
pub use seat_class::{CreateSeatClass, SeatClass, UpdateSeatClass};

use crate::{CoreError, CoreResult};

/// Trimmed value of a mandatory text field.
pub(crate) fn required(field: &str, value: &str) -> CoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// Trimmed value of an optional text field; blank input clears it.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Generates `as_str`, `FromStr` and `Display` for a SCREAMING_SNAKE_CASE status enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::CoreError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;
