//! Airplane time-slot checks.

use chrono::{DateTime, Duration, Utc};

use crate::models::Flight;

/// Half-open interval intersection: `[a_start, a_end)` against `[b_start, b_end)`.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Window an airplane is blocked for, padded by the turnaround time on both sides.
pub fn blocked_window(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    turnaround_minutes: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let pad = Duration::minutes(turnaround_minutes.max(0));
    (departure - pad, arrival + pad)
}

/// First flight in `existing` that clashes with the proposed slot.
pub fn find_conflict<'a>(
    existing: &'a [Flight],
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    turnaround_minutes: i64,
    exclude: Option<uuid::Uuid>,
) -> Option<&'a Flight> {
    let (start, end) = blocked_window(departure, arrival, turnaround_minutes);
    existing.iter().find(|f| {
        Some(f.id) != exclude
            && f.is_active
            && f.status.is_pending()
            && windows_overlap(start, end, f.departure_time, f.arrival_time)
    })
}
