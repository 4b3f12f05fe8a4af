use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use buildlink_types::models::{Conversation, ConversationRef, Message};

use crate::error::MessagingError;

/// All two-party conversations, in creation order.
///
/// At most one conversation exists per unordered participant pair; `send`
/// looks the pair up before creating anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
}

/// A conversation reference resolved from one participant's point of view.
#[derive(Debug, Clone)]
pub struct ResolvedThread<'a> {
    pub other: String,
    /// `None` while no message has been exchanged with `other`.
    pub conversation: Option<&'a Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Order-independent lookup of the conversation between `a` and `b`.
    pub fn find_by_participants(&self, a: &str, b: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.has_pair(a, b))
    }

    /// Conversations `email` takes part in, in store order.
    pub fn list_for_user(&self, email: &str) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.includes(email))
            .collect()
    }

    /// Inbox order: most recent last message first, empty threads last.
    pub fn list_for_user_by_recency(&self, email: &str) -> Vec<&Conversation> {
        let mut list = self.list_for_user(email);
        list.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        list
    }

    /// Append a message from `from` to `to`, creating their conversation on
    /// first contact. Callers reject empty bodies beforehand.
    pub fn send(&mut self, from: &str, to: &str, body: &str) -> Message {
        self.send_at(from, to, body, Utc::now())
    }

    /// `send` with an explicit clock reading.
    pub fn send_at(&mut self, from: &str, to: &str, body: &str, now: DateTime<Utc>) -> Message {
        let participants = canonical_pair(from, to);

        match self
            .conversations
            .iter_mut()
            .find(|c| c.has_pair(&participants[0], &participants[1]))
        {
            Some(conversation) => {
                // Keep timestamps non-decreasing even if the clock steps back.
                let timestamp = conversation
                    .last_activity()
                    .map_or(now, |last| last.max(now));
                let message = new_message(from, to, body, timestamp);
                conversation.messages.push(message.clone());
                debug!(
                    "Appended message {} to conversation {} ({} messages)",
                    message.id,
                    conversation.id,
                    conversation.messages.len()
                );
                message
            }
            None => {
                let message = new_message(from, to, body, now);
                let conversation = Conversation {
                    id: Uuid::new_v4(),
                    participants,
                    messages: vec![message.clone()],
                };
                debug!(
                    "Created conversation {} between {} and {}",
                    conversation.id, conversation.participants[0], conversation.participants[1]
                );
                self.conversations.push(conversation);
                message
            }
        }
    }

    /// Reference to use when `current` wants to talk to `other`: the existing
    /// thread if there is one, otherwise a pending reference.
    pub fn start_with(&self, current: &str, other: &str) -> ConversationRef {
        match self.find_by_participants(current, other) {
            Some(conversation) => ConversationRef::Existing(conversation.id),
            None => ConversationRef::Pending(other.to_string()),
        }
    }

    /// Work out who `current` is talking to through `reference`.
    ///
    /// A pending reference whose conversation has since been created resolves
    /// to that conversation.
    pub fn resolve(
        &self,
        current: &str,
        reference: &ConversationRef,
    ) -> Result<ResolvedThread<'_>, MessagingError> {
        match reference {
            ConversationRef::Existing(id) => {
                let conversation = self
                    .get(*id)
                    .ok_or(MessagingError::ConversationNotFound)?;
                let other = conversation
                    .other_participant(current)
                    .ok_or(MessagingError::ConversationNotFound)?;
                Ok(ResolvedThread {
                    other: other.to_string(),
                    conversation: Some(conversation),
                })
            }
            ConversationRef::Pending(other) => Ok(ResolvedThread {
                other: other.clone(),
                conversation: self.find_by_participants(current, other),
            }),
        }
    }
}

impl From<Vec<Conversation>> for ConversationStore {
    fn from(conversations: Vec<Conversation>) -> Self {
        Self { conversations }
    }
}

fn canonical_pair(a: &str, b: &str) -> [String; 2] {
    let mut pair = [a.to_string(), b.to_string()];
    pair.sort();
    pair
}

fn new_message(from: &str, to: &str, body: &str, timestamp: DateTime<Utc>) -> Message {
    Message {
        id: Uuid::new_v4(),
        from: from.to_string(),
        to: to.to_string(),
        body: body.to_string(),
        timestamp,
    }
}
