use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Account, Message, Role, VerificationStatus};

// -- JWT Claims --

/// Bearer token claims shared by the REST middleware and the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub profile: ProfileResponse,
}

// -- Profiles --

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
}

impl From<&Account> for ProfileResponse {
    fn from(account: &Account) -> Self {
        let arch = account.architect();
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role(),
            specialty: arch.and_then(|a| a.specialty.clone()),
            bio: arch.and_then(|a| a.bio.clone()),
            rating: arch.and_then(|a| a.rating),
            image_url: arch.and_then(|a| a.image_url.clone()),
            verification_status: arch.map(|a| a.verification),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// -- Conversations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartConversationRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartConversationResponse {
    /// Conversation id, or `new_<email>` if no message has been exchanged yet.
    pub conversation: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub conversation_id: Uuid,
    /// True if this message started the conversation.
    pub created: bool,
    pub message: Message,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_participant: ProfileResponse,
    pub last_message: Option<Message>,
    pub message_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub reference: String,
    pub conversation_id: Option<Uuid>,
    pub other_participant: ProfileResponse,
    pub messages: Vec<Message>,
}

// -- AI --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

/// Base64 image bytes plus their mime type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditImageRequest {
    pub prompt: String,
    pub image: ImagePayload,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image: Option<ImagePayload>,
}
