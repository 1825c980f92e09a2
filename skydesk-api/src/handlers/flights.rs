use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use skydesk_core::models::{
    CreateClassFlight, CreateFlight, Flight, FlightStatus, UpdateClassFlight, UpdateFlight,
    UpdateFlightStatus,
};
use skydesk_core::repository::FlightFilter;
use skydesk_core::services::{ClassFlightView, FlightOffer, SeatAvailability};
use skydesk_shared::Page;
use uuid::Uuid;

use super::{created, ok, ApiResult, CreatedResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(list_flights).post(create_flight))
        .route("/flights/search", get(search_flights))
        .route(
            "/flights/{id}",
            get(get_flight).put(update_flight).delete(delete_flight),
        )
        .route("/flights/{id}/status", put(change_status))
        .route("/flights/{id}/classes", get(list_classes))
        .route("/flights/{id}/seats", get(seat_map))
        .route("/class-flights", post(create_class))
        .route(
            "/class-flights/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
}

#[derive(Debug, Default, Deserialize)]
struct FlightQuery {
    page: Option<u32>,
    size: Option<u32>,
    airline_id: Option<Uuid>,
    airplane_id: Option<Uuid>,
    status: Option<FlightStatus>,
    #[serde(default)]
    include_inactive: bool,
}

async fn list_flights(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FlightQuery>,
) -> ApiResult<Page<Flight>> {
    let page = state.services.rules.page(query.page, query.size);
    let filter = FlightFilter {
        airline_id: query.airline_id,
        airplane_id: query.airplane_id,
        status: query.status,
        include_inactive: query.include_inactive,
    };
    ok(state.services.flights.list(&filter, page).await?)
}

async fn create_flight(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateFlight>,
) -> CreatedResult<Flight> {
    created(state.services.flights.create(&req).await?)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    origin: String,
    destination: String,
    date: NaiveDate,
    passengers: Option<u32>,
}

async fn search_flights(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<FlightOffer>> {
    let offers = state
        .services
        .flights
        .search(&query.origin, &query.destination, query.date, query.passengers.unwrap_or(1))
        .await?;
    ok(offers)
}

async fn get_flight(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Flight> {
    ok(state.services.flights.get(id).await?)
}

async fn update_flight(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateFlight>,
) -> ApiResult<Flight> {
    ok(state.services.flights.update(id, &req).await?)
}

async fn delete_flight(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Flight> {
    ok(state.services.flights.delete(id).await?)
}

async fn change_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateFlightStatus>,
) -> ApiResult<Flight> {
    ok(state.services.flights.change_status(id, req.status).await?)
}

async fn list_classes(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Vec<ClassFlightView>> {
    ok(state.services.flights.list_classes(id).await?)
}

async fn seat_map(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Vec<SeatAvailability>> {
    ok(state.services.flights.seat_map(id).await?)
}

async fn create_class(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateClassFlight>,
) -> CreatedResult<ClassFlightView> {
    created(state.services.flights.create_class(&req).await?)
}

async fn get_class(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ClassFlightView> {
    ok(state.services.flights.get_class(id).await?)
}

async fn update_class(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateClassFlight>,
) -> ApiResult<ClassFlightView> {
    ok(state.services.flights.update_class(id, &req).await?)
}

async fn delete_class(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ClassFlightView> {
    ok(state.services.flights.delete_class(id).await?)
}
