//! Airlines, airports and seat classes.

use axum::{extract::State, routing::get, Router};
use serde::Deserialize;
use skydesk_core::models::{
    Airline, Airport, CreateAirline, CreateAirport, CreateSeatClass, SeatClass, UpdateAirline,
    UpdateAirport, UpdateSeatClass,
};
use skydesk_shared::Page;
use uuid::Uuid;

use super::{created, ok, ApiResult, CreatedResult, ListQuery};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airlines", get(list_airlines).post(create_airline))
        .route(
            "/airlines/{id}",
            get(get_airline).put(update_airline).delete(delete_airline),
        )
        .route("/airports", get(list_airports).post(create_airport))
        .route(
            "/airports/{id}",
            get(get_airport).put(update_airport).delete(delete_airport),
        )
        .route("/seat-classes", get(list_seat_classes).post(create_seat_class))
        .route(
            "/seat-classes/{id}",
            get(get_seat_class).put(update_seat_class).delete(delete_seat_class),
        )
}

async fn list_airlines(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Page<Airline>> {
    let page = state.services.rules.page(query.page, query.size);
    ok(state.services.airlines.list(&query.text_filter(), page).await?)
}

async fn create_airline(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateAirline>,
) -> CreatedResult<Airline> {
    created(state.services.airlines.create(&req).await?)
}

async fn get_airline(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airline> {
    ok(state.services.airlines.get(id).await?)
}

async fn update_airline(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateAirline>,
) -> ApiResult<Airline> {
    ok(state.services.airlines.update(id, &req).await?)
}

async fn delete_airline(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airline> {
    ok(state.services.airlines.delete(id).await?)
}

async fn list_airports(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Page<Airport>> {
    let page = state.services.rules.page(query.page, query.size);
    ok(state.services.airports.list(&query.text_filter(), page).await?)
}

async fn create_airport(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateAirport>,
) -> CreatedResult<Airport> {
    created(state.services.airports.create(&req).await?)
}

async fn get_airport(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airport> {
    ok(state.services.airports.get(id).await?)
}

async fn update_airport(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateAirport>,
) -> ApiResult<Airport> {
    ok(state.services.airports.update(id, &req).await?)
}

async fn delete_airport(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airport> {
    ok(state.services.airports.delete(id).await?)
}

#[derive(Debug, Default, Deserialize)]
struct SeatClassQuery {
    #[serde(default)]
    include_inactive: bool,
}

async fn list_seat_classes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SeatClassQuery>,
) -> ApiResult<Vec<SeatClass>> {
    ok(state.services.seat_classes.list(query.include_inactive).await?)
}

async fn create_seat_class(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateSeatClass>,
) -> CreatedResult<SeatClass> {
    created(state.services.seat_classes.create(&req).await?)
}

async fn get_seat_class(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<SeatClass> {
    ok(state.services.seat_classes.get(id).await?)
}

async fn update_seat_class(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateSeatClass>,
) -> ApiResult<SeatClass> {
    ok(state.services.seat_classes.update(id, &req).await?)
}

async fn delete_seat_class(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<SeatClass> {
    ok(state.services.seat_classes.delete(id).await?)
}
