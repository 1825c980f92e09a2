//! Human-facing identifiers built from per-key sequences.

use chrono::{DateTime, Utc};

pub fn airplane_sequence_key(airline_code: &str) -> String {
    format!("airplane:{}", airline_code)
}

pub fn flight_sequence_key(airline_code: &str) -> String {
    format!("flight:{}", airline_code)
}

pub fn booking_sequence_key(at: DateTime<Utc>) -> String {
    format!("booking:{}", at.format("%y%m%d"))
}

/// `VN-0001`
pub fn registration_code(airline_code: &str, seq: i64) -> String {
    format!("{}-{:04}", airline_code, seq)
}

/// `VN0001`
pub fn flight_number(airline_code: &str, seq: i64) -> String {
    format!("{}{:04}", airline_code, seq)
}

/// `BK2610150001`: day stamp plus the day's running counter.
pub fn booking_number(at: DateTime<Utc>, seq: i64) -> String {
    format!("BK{}{:04}", at.format("%y%m%d"), seq)
}

pub fn invoice_number(booking_number: &str) -> String {
    format!("INV-{}", booking_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats() {
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap();
        assert_eq!(registration_code("VN", 7), "VN-0007");
        assert_eq!(flight_number("QH", 123), "QH0123");
        assert_eq!(booking_number(at, 42), "BK2610150042");
        assert_eq!(invoice_number("BK2610150042"), "INV-BK2610150042");
        assert_eq!(booking_sequence_key(at), "booking:261015");
    }

    #[test]
    fn test_wide_sequences_are_not_truncated() {
        assert_eq!(flight_number("VN", 12345), "VN12345");
    }
}
