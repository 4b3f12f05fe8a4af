use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use buildlink_types::api::{
    Claims, ConversationSummary, ProfileResponse, SendMessageRequest, SendMessageResponse,
    StartConversationRequest, StartConversationResponse, ThreadResponse,
};
use buildlink_types::events::GatewayEvent;
use buildlink_types::models::ConversationRef;

use crate::auth::AppState;
use crate::error::ApiError;

fn parse_reference(raw: &str) -> Result<ConversationRef, ApiError> {
    raw.parse::<ConversationRef>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Reference to use for talking to `req.email`: the existing conversation
/// id, or `new_<email>` until the first message is sent.
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartConversationRequest>,
) -> Result<Json<StartConversationResponse>, ApiError> {
    let reference = state
        .portal()?
        .start_conversation(&claims.sub, req.email.trim())?;
    Ok(Json(StartConversationResponse {
        conversation: reference.to_string(),
    }))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let portal = state.portal()?;
    let summaries = portal
        .inbox(&claims.sub)
        .into_iter()
        .map(|entry| ConversationSummary {
            id: entry.conversation.id,
            other_participant: ProfileResponse::from(entry.other),
            last_message: entry.conversation.last_message().cloned(),
            message_count: entry.conversation.messages.len(),
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reference): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let reference = parse_reference(&reference)?;
    let portal = state.portal()?;
    let thread = portal.thread(&claims.sub, &reference)?;

    Ok(Json(ThreadResponse {
        reference: reference.to_string(),
        conversation_id: thread.conversation.map(|c| c.id),
        other_participant: ProfileResponse::from(thread.other),
        messages: thread
            .conversation
            .map(|c| c.messages.clone())
            .unwrap_or_default(),
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reference): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = parse_reference(&reference)?;
    let sent = state
        .portal()?
        .send_message(&claims.sub, &reference, &req.body)?;

    state
        .dispatcher
        .send_to_user(
            &sent.message.to,
            GatewayEvent::MessageCreate {
                conversation_id: sent.conversation_id,
                message: sent.message.clone(),
            },
        )
        .await;

    let status = if sent.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SendMessageResponse {
            conversation_id: sent.conversation_id,
            created: sent.created,
            message: sent.message,
        }),
    ))
}
