//! Bookings and their billing records.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use skydesk_core::models::{Billing, BillingStatus, Booking, BookingStatus, CreateBooking, PayBilling};
use skydesk_core::repository::{BillingFilter, BookingFilter};
use skydesk_shared::Page;
use uuid::Uuid;

use super::{created, ok, ApiResult, CreatedResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).delete(cancel_booking))
        .route("/bookings/number/{number}", get(get_booking_by_number))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/billing", get(booking_billing))
        .route("/billings", get(list_billings))
        .route("/billings/{id}", get(get_billing))
        .route("/billings/{id}/pay", post(pay_billing))
}

#[derive(Debug, Default, Deserialize)]
struct BookingQuery {
    page: Option<u32>,
    size: Option<u32>,
    flight_id: Option<Uuid>,
    passenger_id: Option<Uuid>,
    status: Option<BookingStatus>,
}

async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BookingQuery>,
) -> ApiResult<Page<Booking>> {
    let page = state.services.rules.page(query.page, query.size);
    let filter = BookingFilter {
        flight_id: query.flight_id,
        passenger_id: query.passenger_id,
        status: query.status,
    };
    ok(state.services.bookings.list(&filter, page).await?)
}

async fn create_booking(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateBooking>,
) -> CreatedResult<Booking> {
    created(state.services.bookings.create(&req).await?)
}

async fn get_booking(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Booking> {
    ok(state.services.bookings.get(id).await?)
}

async fn get_booking_by_number(
    State(state): State<AppState>,
    AppPath(number): AppPath<String>,
) -> ApiResult<Booking> {
    ok(state.services.bookings.get_by_number(&number).await?)
}

async fn cancel_booking(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Booking> {
    ok(state.services.bookings.cancel(id).await?)
}

async fn booking_billing(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Billing> {
    ok(state.services.bookings.billing_for_booking(id).await?)
}

#[derive(Debug, Default, Deserialize)]
struct BillingQuery {
    page: Option<u32>,
    size: Option<u32>,
    status: Option<BillingStatus>,
}

async fn list_billings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BillingQuery>,
) -> ApiResult<Page<Billing>> {
    let page = state.services.rules.page(query.page, query.size);
    let filter = BillingFilter { status: query.status };
    ok(state.services.bookings.list_billings(&filter, page).await?)
}

async fn get_billing(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Billing> {
    ok(state.services.bookings.get_billing(id).await?)
}

async fn pay_billing(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<PayBilling>,
) -> ApiResult<Billing> {
    ok(state.services.bookings.pay(id, &req).await?)
}
