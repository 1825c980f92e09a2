use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use skydesk_shared::ApiResponse;
use tracing::{info, warn};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::auth::{AdminClaims, ADMIN_ROLE};
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/token", post(issue_token))
}

/// Signs an admin token for `subject`.
pub fn admin_token(auth: &AuthConfig, subject: &str) -> Result<String, AppError> {
    let claims = AdminClaims {
        sub: subject.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

async fn issue_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    if req.username != state.auth.admin_username || req.password != state.auth.admin_password {
        warn!(username = %req.username, "Rejected admin login");
        return Err(AppError::AuthenticationError("Invalid username or password".to_string()));
    }

    let token = admin_token(&state.auth, &req.username)?;
    info!(username = %req.username, "Admin token issued");

    Ok(Json(ApiResponse::ok(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.expiration,
    })))
}
