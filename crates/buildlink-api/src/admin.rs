use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use tracing::{info, warn};

use buildlink_types::api::ProfileResponse;
use buildlink_types::events::GatewayEvent;
use buildlink_types::models::VerificationStatus;

use crate::auth::AppState;
use crate::error::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Approve a pending architect verification.
pub async fn verify_architect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let expected = state.admin_token.as_deref().ok_or(ApiError::NotFound)?;
    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        warn!("Rejected admin verification of {}", email);
        return Err(ApiError::Unauthorized);
    }

    let account = state.portal()?.mark_verified(&email)?;
    info!("{} verified by admin", account.email);

    state
        .dispatcher
        .send_to_user(
            &account.email,
            GatewayEvent::VerificationUpdate {
                email: account.email.clone(),
                status: VerificationStatus::Verified,
            },
        )
        .await;

    Ok(Json(ProfileResponse::from(&account)))
}
