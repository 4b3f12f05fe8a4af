use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// -- Accounts --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Architect,
}

/// Progress of an architect through license/identity review.
/// Only ever moves forward: unverified -> pending -> verified.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectProfile {
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub rating: Option<f32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub verification: VerificationStatus,
}

/// Role-specific part of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Client,
    Architect(ArchitectProfile),
}

impl Profile {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Client => Self::Client,
            Role::Architect => Self::Architect(ArchitectProfile::default()),
        }
    }
}

/// A registered account. The email is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub profile: Profile,
}

impl Account {
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Client => Role::Client,
            Profile::Architect(_) => Role::Architect,
        }
    }

    pub fn is_architect(&self) -> bool {
        self.role() == Role::Architect
    }

    pub fn architect(&self) -> Option<&ArchitectProfile> {
        match &self.profile {
            Profile::Architect(p) => Some(p),
            Profile::Client => None,
        }
    }

    pub fn architect_mut(&mut self) -> Option<&mut ArchitectProfile> {
        match &mut self.profile {
            Profile::Architect(p) => Some(p),
            Profile::Client => None,
        }
    }

    pub fn verification(&self) -> Option<VerificationStatus> {
        self.architect().map(|p| p.verification)
    }
}

// -- Messaging --

/// A private message. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// A two-party thread. `participants` is kept sorted so the pair has one
/// canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participants: [String; 2],
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn includes(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p == email)
    }

    /// Order-independent pair match.
    pub fn has_pair(&self, a: &str, b: &str) -> bool {
        let [p0, p1] = &self.participants;
        (p0 == a && p1 == b) || (p0 == b && p1 == a)
    }

    /// The participant that isn't `email`, or `None` if `email` is not part of
    /// this conversation.
    pub fn other_participant(&self, email: &str) -> Option<&str> {
        let [p0, p1] = &self.participants;
        if p0 == email {
            Some(p1)
        } else if p1 == email {
            Some(p0)
        } else {
            None
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message().map(|m| m.timestamp)
    }
}

// -- Conversation references --

/// Prefix of a reference to a conversation that has not been created yet.
pub const PENDING_CONVERSATION_PREFIX: &str = "new_";

/// Addresses a thread either by id or, before the first message exists, by
/// the other participant's email (`new_<email>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationRef {
    Existing(Uuid),
    Pending(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid conversation reference: {0}")]
pub struct ParseConversationRefError(String);

impl FromStr for ConversationRef {
    type Err = ParseConversationRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(email) = s.strip_prefix(PENDING_CONVERSATION_PREFIX) {
            if email.is_empty() {
                return Err(ParseConversationRefError(s.to_string()));
            }
            return Ok(Self::Pending(email.to_string()));
        }
        s.parse::<Uuid>()
            .map(Self::Existing)
            .map_err(|_| ParseConversationRefError(s.to_string()))
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing(id) => write!(f, "{id}"),
            Self::Pending(email) => write!(f, "{PENDING_CONVERSATION_PREFIX}{email}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(a: &str, b: &str) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            participants: [a.to_string(), b.to_string()],
            messages: vec![],
        }
    }

    #[test]
    fn pair_match_ignores_order() {
        let conv = conversation("a@x.com", "b@x.com");
        assert!(conv.has_pair("a@x.com", "b@x.com"));
        assert!(conv.has_pair("b@x.com", "a@x.com"));
        assert!(!conv.has_pair("a@x.com", "c@x.com"));
    }

    #[test]
    fn other_participant_requires_membership() {
        let conv = conversation("a@x.com", "b@x.com");
        assert_eq!(conv.other_participant("a@x.com"), Some("b@x.com"));
        assert_eq!(conv.other_participant("b@x.com"), Some("a@x.com"));
        assert_eq!(conv.other_participant("c@x.com"), None);
    }

    #[test]
    fn pending_reference_parses_email() {
        let r: ConversationRef = "new_arch@x.com".parse().unwrap();
        assert_eq!(r, ConversationRef::Pending("arch@x.com".into()));
        assert_eq!(r.to_string(), "new_arch@x.com");
    }

    #[test]
    fn existing_reference_parses_uuid() {
        let id = Uuid::new_v4();
        let r: ConversationRef = id.to_string().parse().unwrap();
        assert_eq!(r, ConversationRef::Existing(id));
    }

    #[test]
    fn garbage_reference_is_rejected() {
        assert!("conv_123".parse::<ConversationRef>().is_err());
        assert!("new_".parse::<ConversationRef>().is_err());
    }

    #[test]
    fn parse_error_is_a_std_error() {
        let err = "conv_123".parse::<ConversationRef>().unwrap_err();
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(boxed.to_string(), "invalid conversation reference: conv_123");
    }

    #[test]
    fn profile_serializes_with_role_tag() {
        let json = serde_json::to_value(Profile::Client).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "client" }));

        let arch = Profile::Architect(ArchitectProfile {
            specialty: Some("Residential".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&arch).unwrap();
        assert_eq!(json["role"], "architect");
        assert_eq!(json["verification"], "unverified");
        let back: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(back, arch);
    }
}
