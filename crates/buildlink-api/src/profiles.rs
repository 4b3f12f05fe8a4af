use axum::{
    Extension, Json,
    extract::{Path, State},
};

use buildlink_core::{AccountError, ArchitectProfileUpdate};
use buildlink_types::api::{Claims, ProfileResponse, UpdateProfileRequest, UpdateSettingsRequest};
use buildlink_types::events::GatewayEvent;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let portal = state.portal()?;
    let account = portal
        .accounts()
        .get(&claims.sub)
        .ok_or(AccountError::UnknownUser)?;
    Ok(Json(ProfileResponse::from(account)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state.portal()?.update_settings(&claims.sub, &req.name)?;
    Ok(Json(ProfileResponse::from(&account)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let update = ArchitectProfileUpdate {
        name: req.name,
        specialty: req.specialty,
        bio: req.bio,
        image_url: req.image_url,
    };
    let account = state
        .portal()?
        .update_architect_profile(&claims.sub, update)?;
    Ok(Json(ProfileResponse::from(&account)))
}

pub async fn submit_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state.portal()?.submit_verification(&claims.sub)?;

    if let Some(status) = account.verification() {
        state
            .dispatcher
            .send_to_user(
                &account.email,
                GatewayEvent::VerificationUpdate {
                    email: account.email.clone(),
                    status,
                },
            )
            .await;
    }

    Ok(Json(ProfileResponse::from(&account)))
}

/// Architect directory, in registration order.
pub async fn list_architects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let portal = state.portal()?;
    let architects = portal
        .accounts()
        .architects()
        .map(ProfileResponse::from)
        .collect();
    Ok(Json(architects))
}

pub async fn get_architect(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let portal = state.portal()?;
    let account = portal
        .accounts()
        .get(&email)
        .filter(|a| a.is_architect())
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ProfileResponse::from(account)))
}
