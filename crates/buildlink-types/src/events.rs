use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, VerificationStatus};

/// Events pushed to a user over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { email: String, name: String },

    /// A message was appended to one of the user's conversations
    MessageCreate {
        conversation_id: Uuid,
        message: Message,
    },

    /// The user's verification status changed
    VerificationUpdate {
        email: String,
        status: VerificationStatus,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },
}
