use std::sync::{Arc, Mutex, MutexGuard};

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use buildlink_ai::GeminiClient;
use buildlink_core::{AccountError, Portal, RegistrationForm, password};
use buildlink_gateway::Dispatcher;
use buildlink_types::api::{AuthResponse, Claims, LoginRequest, ProfileResponse, RegisterRequest};
use buildlink_types::models::Account;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Never held across an `.await`.
    pub portal: Mutex<Portal>,
    pub jwt_secret: String,
    /// Admin routes answer 404 while this is unset.
    pub admin_token: Option<String>,
    pub ai: GeminiClient,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(
        portal: Portal,
        jwt_secret: String,
        admin_token: Option<String>,
        ai: GeminiClient,
        dispatcher: Dispatcher,
    ) -> AppState {
        Arc::new(Self {
            portal: Mutex::new(portal),
            jwt_secret,
            admin_token,
            ai,
            dispatcher,
        })
    }

    pub fn portal(&self) -> Result<MutexGuard<'_, Portal>, ApiError> {
        self.portal
            .lock()
            .map_err(|_| anyhow::anyhow!("portal lock poisoned").into())
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = RegistrationForm {
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
        role: req.role,
    };
    // Hash outside the portal lock
    let prepared = tokio::task::spawn_blocking(move || form.prepare())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::Error::from(e)
        })??;

    let account = state.portal()?.register_prepared(prepared)?;
    let token = create_token(&state.jwt_secret, &account)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            profile: ProfileResponse::from(&account),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let candidate = state
        .portal()?
        .accounts()
        .login_candidate(&req.email, &req.password)?
        .clone();

    let stored_hash = candidate.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || {
        password::verify_password(&req.password, &stored_hash)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        anyhow::Error::from(e)
    })?;
    if !matches {
        return Err(AccountError::IncorrectPassword.into());
    }

    let account = state.portal()?.start_session(&candidate.email)?;
    let token = create_token(&state.jwt_secret, &account)?;

    Ok(Json(AuthResponse {
        token,
        profile: ProfileResponse::from(&account),
    }))
}

/// Ends the caller's stored session. Issued tokens stay valid until they
/// expire.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    state.portal()?.logout(&claims.sub)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_token(secret: &str, account: &Account) -> anyhow::Result<String> {
    let claims = Claims {
        sub: account.email.clone(),
        name: account.name.clone(),
        role: account.role(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    info!("Issued token for {}", account.email);
    Ok(token)
}
