use thiserror::Error;

/// Shown whenever AI is used without an API key.
pub const AI_UNAVAILABLE_MESSAGE: &str = "AI service is not configured. Please ensure the API_KEY is set correctly in your environment variables.";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{}", AI_UNAVAILABLE_MESSAGE)]
    NotConfigured,

    #[error("Failed to reach the AI service: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse AI service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("AI service blocked the prompt: {0}")]
    Blocked(String),

    #[error("AI service returned no content")]
    EmptyResponse,

    #[error("No image data found in response")]
    NoImageData,
}
