use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::{AI_UNAVAILABLE_MESSAGE, AiError};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineImage,
    OutputOptions, Part, PredictInstance, PredictParameters, PredictRequest, PredictResponse,
};

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model behind the portal's chat assistant.
pub const CHAT_MODEL: &str = "gemini-flash-lite-latest";
pub const IMAGE_EDIT_MODEL: &str = "gemini-2.5-flash-image";
pub const IMAGE_GENERATION_MODEL: &str = "imagen-4.0-generate-001";

/// Thin Gemini client. Without an API key every call fails with
/// [`AiError::NotConfigured`].
///
/// There is no timeout or retry beyond reqwest's defaults, and a call cannot
/// be cancelled once started.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("API_KEY not set. AI features will be disabled.");
        }
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at another endpoint (proxy, mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `prompt` to `model` and return the text of its answer.
    pub async fn generate_text(&self, prompt: &str, model: &str) -> Result<String, AiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::text(prompt)],
            }],
            generation_config: None,
        };

        let response: GenerateContentResponse = self
            .post(&format!("models/{model}:generateContent"), &request)
            .await?;

        if let Some(reason) = response.block_reason() {
            return Err(AiError::Blocked(reason.to_string()));
        }
        response.text().ok_or(AiError::EmptyResponse)
    }

    /// Chat assistant reply. Never fails: errors are logged and turned into a
    /// message the user can read.
    pub async fn chat_reply(&self, prompt: &str) -> String {
        match self.generate_text(prompt, CHAT_MODEL).await {
            Ok(text) => text,
            Err(AiError::NotConfigured) => AI_UNAVAILABLE_MESSAGE.to_string(),
            Err(e) => {
                error!("Error with {}: {}", CHAT_MODEL, e);
                format!(
                    "Error processing your request with {CHAT_MODEL}. Please check the server logs for details."
                )
            }
        }
    }

    /// Edit `image` according to `prompt`, returning the new image.
    pub async fn edit_image(
        &self,
        prompt: &str,
        image: &InlineImage,
    ) -> Result<InlineImage, AiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::image(image.clone()), Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            }),
        };

        let response: GenerateContentResponse = self
            .post(
                &format!("models/{IMAGE_EDIT_MODEL}:generateContent"),
                &request,
            )
            .await
            .inspect_err(|e| error!("Error editing image: {}", e))?;

        if let Some(reason) = response.block_reason() {
            return Err(AiError::Blocked(reason.to_string()));
        }
        response.first_image().cloned().ok_or(AiError::NoImageData)
    }

    /// Generate one square PNG from `prompt`. `None` if the service produced
    /// no image.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<InlineImage>, AiError> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_options: OutputOptions {
                    mime_type: "image/png".to_string(),
                },
                aspect_ratio: "1:1".to_string(),
            },
        };

        let response: PredictResponse = self
            .post(&format!("models/{IMAGE_GENERATION_MODEL}:predict"), &request)
            .await
            .inspect_err(|e| error!("Error generating image: {}", e))?;

        Ok(response.predictions.into_iter().find_map(|p| {
            p.bytes_base64_encoded.map(|data| InlineImage {
                mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
                data,
            })
        }))
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, AiError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}/{}", self.base_url, path);

        debug!(url = %url, "Calling Gemini API");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let client = GeminiClient::new(None);
        assert!(!client.is_available());
        assert!(matches!(
            client.generate_text("hi", CHAT_MODEL).await,
            Err(AiError::NotConfigured)
        ));
        assert!(matches!(
            client.generate_image("a house").await,
            Err(AiError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn unconfigured_chat_reply_explains_itself() {
        let client = GeminiClient::new(Some("   ".to_string()));
        assert_eq!(client.chat_reply("hi").await, AI_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GeminiClient::new(None).with_base_url("http://localhost:1234/");
        assert_eq!(client.base_url, "http://localhost:1234");
    }
}
