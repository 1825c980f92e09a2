use axum::{extract::State, routing::get, Router};
use skydesk_core::models::{CreatePassenger, Passenger, UpdatePassenger};
use skydesk_shared::Page;
use uuid::Uuid;

use super::{created, ok, ApiResult, CreatedResult, ListQuery};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/passengers", get(list_passengers).post(create_passenger))
        .route(
            "/passengers/{id}",
            get(get_passenger).put(update_passenger).delete(delete_passenger),
        )
}

async fn list_passengers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Page<Passenger>> {
    let page = state.services.rules.page(query.page, query.size);
    ok(state.services.passengers.list(&query.text_filter(), page).await?)
}

async fn create_passenger(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreatePassenger>,
) -> CreatedResult<Passenger> {
    created(state.services.passengers.create(&req).await?)
}

async fn get_passenger(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Passenger> {
    ok(state.services.passengers.get(id).await?)
}

async fn update_passenger(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdatePassenger>,
) -> ApiResult<Passenger> {
    ok(state.services.passengers.update(id, &req).await?)
}

async fn delete_passenger(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Passenger> {
    ok(state.services.passengers.delete(id).await?)
}
