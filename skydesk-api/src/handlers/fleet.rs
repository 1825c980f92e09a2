use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use skydesk_core::models::{
    Airplane, AirplaneStatus, CreateAirplane, CreateSeat, GenerateSeatLayout, Seat, UpdateAirplane,
    UpdateSeat,
};
use skydesk_core::repository::{AirplaneFilter, SeatFilter};
use skydesk_shared::Page;
use uuid::Uuid;

use super::{created, ok, ApiResult, CreatedResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airplanes", get(list_airplanes).post(create_airplane))
        .route(
            "/airplanes/{id}",
            get(get_airplane).put(update_airplane).delete(delete_airplane),
        )
        .route("/airplanes/{id}/seats", get(list_seats))
        .route("/airplanes/{id}/seats/layout", post(generate_layout))
        .route("/seats", post(create_seat))
        .route("/seats/{id}", get(get_seat).put(update_seat).delete(delete_seat))
}

#[derive(Debug, Default, Deserialize)]
struct AirplaneQuery {
    page: Option<u32>,
    size: Option<u32>,
    airline_id: Option<Uuid>,
    status: Option<AirplaneStatus>,
    #[serde(default)]
    include_inactive: bool,
}

async fn list_airplanes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AirplaneQuery>,
) -> ApiResult<Page<Airplane>> {
    let page = state.services.rules.page(query.page, query.size);
    let filter = AirplaneFilter {
        airline_id: query.airline_id,
        status: query.status,
        include_inactive: query.include_inactive,
    };
    ok(state.services.fleet.list_airplanes(&filter, page).await?)
}

async fn create_airplane(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateAirplane>,
) -> CreatedResult<Airplane> {
    created(state.services.fleet.create_airplane(&req).await?)
}

async fn get_airplane(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airplane> {
    ok(state.services.fleet.get_airplane(id).await?)
}

async fn update_airplane(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateAirplane>,
) -> ApiResult<Airplane> {
    ok(state.services.fleet.update_airplane(id, &req).await?)
}

async fn delete_airplane(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Airplane> {
    ok(state.services.fleet.delete_airplane(id).await?)
}

#[derive(Debug, Default, Deserialize)]
struct SeatQuery {
    seat_class_id: Option<Uuid>,
    #[serde(default)]
    include_inactive: bool,
}

async fn list_seats(
    State(state): State<AppState>,
    AppPath(airplane_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<SeatQuery>,
) -> ApiResult<Vec<Seat>> {
    let filter = SeatFilter {
        seat_class_id: query.seat_class_id,
        include_inactive: query.include_inactive,
    };
    ok(state.services.fleet.list_seats(airplane_id, &filter).await?)
}

async fn generate_layout(
    State(state): State<AppState>,
    AppPath(airplane_id): AppPath<Uuid>,
    AppJson(req): AppJson<GenerateSeatLayout>,
) -> CreatedResult<Vec<Seat>> {
    created(state.services.fleet.generate_layout(airplane_id, &req).await?)
}

async fn create_seat(State(state): State<AppState>, AppJson(req): AppJson<CreateSeat>) -> CreatedResult<Seat> {
    created(state.services.fleet.create_seat(&req).await?)
}

async fn get_seat(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Seat> {
    ok(state.services.fleet.get_seat(id).await?)
}

async fn update_seat(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateSeat>,
) -> ApiResult<Seat> {
    ok(state.services.fleet.update_seat(id, &req).await?)
}

async fn delete_seat(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Seat> {
    ok(state.services.fleet.delete_seat(id).await?)
}
