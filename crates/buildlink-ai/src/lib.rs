//! Client for the generative AI features of the portal: a text assistant,
//! image editing and image generation, all backed by the Gemini API.

pub mod client;
pub mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::AiError;
pub use types::InlineImage;
