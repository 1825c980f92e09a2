pub mod bookings;
pub mod fleet;
pub mod flights;
pub mod passengers;
pub mod reference;

use axum::{http::StatusCode, Json};
use serde::Deserialize;
use skydesk_core::repository::TextFilter;
use skydesk_shared::ApiResponse;

use crate::error::AppError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

pub fn created<T>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::created(data))))
}

/// `?page=&size=&q=&include_inactive=` shared by the plain listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub q: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl ListQuery {
    pub fn text_filter(&self) -> TextFilter {
        TextFilter {
            q: self.q.clone().filter(|q| !q.trim().is_empty()),
            include_inactive: self.include_inactive,
        }
    }
}
