use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use buildlink_gateway::connection;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{admin, ai, conversations, profiles};

/// The full HTTP surface: public auth routes, bearer-protected routes, the
/// admin route and the WebSocket gateway.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/admin/architects/{email}/verify",
            post(admin::verify_architect),
        );

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(profiles::me))
        .route("/me/settings", put(profiles::update_settings))
        .route("/me/profile", put(profiles::update_profile))
        .route("/me/verification", post(profiles::submit_verification))
        .route("/architects", get(profiles::list_architects))
        .route("/architects/{email}", get(profiles::get_architect))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/start", post(conversations::start_conversation))
        .route("/conversations/{reference}", get(conversations::get_thread))
        .route(
            "/conversations/{reference}/messages",
            post(conversations::send_message),
        )
        .route("/ai/chat", post(ai::chat))
        .route("/ai/images/edit", post(ai::edit_image))
        .route("/ai/images/generate", post(ai::generate_image))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let ws_route = Router::new().route("/gateway", get(ws_upgrade));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let jwt_secret = state.jwt_secret.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, jwt_secret))
}
