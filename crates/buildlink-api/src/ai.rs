use axum::{Json, extract::State};
use base64::{Engine, engine::general_purpose::STANDARD};

use buildlink_ai::InlineImage;
use buildlink_types::api::{
    ChatRequest, ChatResponse, EditImageRequest, GenerateImageRequest, ImagePayload, ImageResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

fn require_prompt(prompt: &str) -> Result<(), ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt cannot be empty.".into()));
    }
    Ok(())
}

fn to_payload(image: InlineImage) -> ImagePayload {
    ImagePayload {
        data: image.data,
        mime_type: image.mime_type,
    }
}

/// Assistant reply. AI failures come back as reply text, not as errors.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    require_prompt(&req.prompt)?;
    let text = state.ai.chat_reply(&req.prompt).await;
    Ok(Json(ChatResponse { text }))
}

pub async fn edit_image(
    State(state): State<AppState>,
    Json(req): Json<EditImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    require_prompt(&req.prompt)?;
    if !req.image.mime_type.starts_with("image/") {
        return Err(ApiError::BadRequest("Unsupported image type.".into()));
    }
    STANDARD
        .decode(&req.image.data)
        .map_err(|_| ApiError::BadRequest("Image data is not valid base64.".into()))?;

    let image = InlineImage {
        mime_type: req.image.mime_type,
        data: req.image.data,
    };
    let edited = state.ai.edit_image(&req.prompt, &image).await?;

    Ok(Json(ImageResponse {
        image: Some(to_payload(edited)),
    }))
}

pub async fn generate_image(
    State(state): State<AppState>,
    Json(req): Json<GenerateImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    require_prompt(&req.prompt)?;
    let image = state.ai.generate_image(&req.prompt).await?;
    Ok(Json(ImageResponse {
        image: image.map(to_payload),
    }))
}
