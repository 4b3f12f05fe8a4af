use anyhow::Context;
use tracing::{debug, info, warn};
use uuid::Uuid;

use buildlink_db::Database;
use buildlink_types::models::{Account, Conversation, ConversationRef, Message};

use crate::accounts::{
    AccountDirectory, ArchitectProfileUpdate, PreparedRegistration, RegistrationForm,
};
use crate::conversations::ConversationStore;
use crate::error::{AccountError, MessagingError, PortalError};
use crate::session::{self, SESSION_KEY, Session};

/// Blob key of the account directory.
pub const USERS_KEY: &str = "buildlink_users";
/// Blob key of the conversation store.
pub const CONVERSATIONS_KEY: &str = "buildlink_conversations";

/// Accounts, conversations and the active session, backed by a blob
/// database. Each mutation rewrites the affected documents in full before
/// returning; if the write fails, the in-memory state is left as it was.
pub struct Portal {
    db: Database,
    accounts: AccountDirectory,
    conversations: ConversationStore,
    session: Option<Session>,
}

/// Result of [`Portal::send_message`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub conversation_id: Uuid,
    /// True if this message started the conversation.
    pub created: bool,
    pub message: Message,
}

/// One inbox row.
#[derive(Debug, Clone, Copy)]
pub struct InboxEntry<'a> {
    pub conversation: &'a Conversation,
    pub other: &'a Account,
}

/// A thread as seen by one participant.
#[derive(Debug, Clone, Copy)]
pub struct Thread<'a> {
    pub conversation: Option<&'a Conversation>,
    pub other: &'a Account,
}

impl Portal {
    /// Load every document from `db`. Missing documents start empty.
    pub fn open(db: Database) -> anyhow::Result<Self> {
        let accounts: AccountDirectory = load_document(&db, USERS_KEY)?;
        let conversations: ConversationStore = load_document(&db, CONVERSATIONS_KEY)?;
        let session = session::load(&db).context("failed to load session")?;

        info!(
            "Portal loaded: {} accounts, {} conversations",
            accounts.len(),
            conversations.len()
        );

        Ok(Self {
            db,
            accounts,
            conversations,
            session,
        })
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// The logged-in account, if the stored session still resolves to one.
    pub fn current_session(&self) -> Option<&Account> {
        self.session
            .as_ref()
            .and_then(|s| self.accounts.get(&s.email))
    }

    // -- Accounts --

    /// Register and log in.
    pub fn register(&mut self, form: RegistrationForm) -> Result<Account, PortalError> {
        self.register_prepared(form.prepare()?)
    }

    /// `register` for a form that was already checked and hashed.
    pub fn register_prepared(
        &mut self,
        prepared: PreparedRegistration,
    ) -> Result<Account, PortalError> {
        let mut accounts = self.accounts.clone();
        let account = accounts.insert(prepared)?;
        let session = Session::start(&account.email);

        let users = serde_json::to_string(&accounts)?;
        let session_json = serde_json::to_string(&session)?;
        self.db
            .put_blobs(&[(USERS_KEY, users.as_str()), (SESSION_KEY, session_json.as_str())])?;

        self.accounts = accounts;
        self.session = Some(session);
        Ok(account)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Account, PortalError> {
        let email = self.accounts.login(email, password)?.email.clone();
        self.start_session(&email)
    }

    /// Record `email` as the logged-in account. The password must have been
    /// checked already.
    pub fn start_session(&mut self, email: &str) -> Result<Account, PortalError> {
        let account = self
            .accounts
            .get(email)
            .cloned()
            .ok_or(AccountError::UnknownUser)?;
        let session = Session::start(&account.email);
        self.db
            .put_blob(SESSION_KEY, &serde_json::to_string(&session)?)?;
        self.session = Some(session);
        debug!("{} logged in", account.email);
        Ok(account)
    }

    /// End `email`'s session. A session held by another account is left
    /// alone.
    pub fn logout(&mut self, email: &str) -> Result<(), PortalError> {
        if self.session.as_ref().is_none_or(|s| s.email != email) {
            return Ok(());
        }
        session::clear(&self.db)?;
        self.session = None;
        debug!("{} logged out", email);
        Ok(())
    }

    pub fn update_settings(&mut self, email: &str, name: &str) -> Result<Account, PortalError> {
        self.commit_accounts(|accounts| accounts.update_settings(email, name))
    }

    pub fn update_architect_profile(
        &mut self,
        email: &str,
        update: ArchitectProfileUpdate,
    ) -> Result<Account, PortalError> {
        self.commit_accounts(|accounts| accounts.update_architect_profile(email, update))
    }

    pub fn submit_verification(&mut self, email: &str) -> Result<Account, PortalError> {
        self.commit_accounts(|accounts| accounts.submit_verification(email))
    }

    /// Administrative approval of a pending verification.
    pub fn mark_verified(&mut self, email: &str) -> Result<Account, PortalError> {
        self.commit_accounts(|accounts| accounts.mark_verified(email))
    }

    // -- Messaging --

    /// Reference for `current` to open a thread with `other`.
    pub fn start_conversation(
        &self,
        current: &str,
        other: &str,
    ) -> Result<ConversationRef, PortalError> {
        self.check_recipient(current, other)?;
        Ok(self.conversations.start_with(current, other))
    }

    pub fn send_message(
        &mut self,
        from: &str,
        reference: &ConversationRef,
        body: &str,
    ) -> Result<SentMessage, PortalError> {
        if body.trim().is_empty() {
            return Err(MessagingError::EmptyBody.into());
        }
        let to = self.conversations.resolve(from, reference)?.other;
        self.check_recipient(from, &to)?;

        let mut conversations = self.conversations.clone();
        let message = conversations.send(from, &to, body);
        let conversation_id = conversations
            .find_by_participants(from, &to)
            .map(|c| c.id)
            .ok_or(MessagingError::ConversationNotFound)?;
        let created = conversations.len() > self.conversations.len();

        self.db
            .put_blob(CONVERSATIONS_KEY, &serde_json::to_string(&conversations)?)?;
        self.conversations = conversations;

        Ok(SentMessage {
            conversation_id,
            created,
            message,
        })
    }

    /// `email`'s conversations, most recent first. Rows whose other
    /// participant has no account are left out.
    pub fn inbox(&self, email: &str) -> Vec<InboxEntry<'_>> {
        self.conversations
            .list_for_user_by_recency(email)
            .into_iter()
            .filter_map(|conversation| {
                let other_email = conversation.other_participant(email)?;
                match self.accounts.get(other_email) {
                    Some(other) => Some(InboxEntry {
                        conversation,
                        other,
                    }),
                    None => {
                        warn!(
                            "Conversation {} references unknown account {}",
                            conversation.id, other_email
                        );
                        None
                    }
                }
            })
            .collect()
    }

    pub fn thread(
        &self,
        current: &str,
        reference: &ConversationRef,
    ) -> Result<Thread<'_>, PortalError> {
        let resolved = self.conversations.resolve(current, reference)?;
        let other = self
            .accounts
            .get(&resolved.other)
            .ok_or(MessagingError::UnknownRecipient)?;
        Ok(Thread {
            conversation: resolved.conversation,
            other,
        })
    }

    fn check_recipient(&self, from: &str, to: &str) -> Result<(), MessagingError> {
        if from == to {
            return Err(MessagingError::SelfMessage);
        }
        if self.accounts.get(to).is_none() {
            return Err(MessagingError::UnknownRecipient);
        }
        Ok(())
    }

    /// Apply `change` to a copy of the directory and keep it only once it is
    /// stored.
    fn commit_accounts<T>(
        &mut self,
        change: impl FnOnce(&mut AccountDirectory) -> Result<T, AccountError>,
    ) -> Result<T, PortalError> {
        let mut accounts = self.accounts.clone();
        let out = change(&mut accounts)?;
        self.db
            .put_blob(USERS_KEY, &serde_json::to_string(&accounts)?)?;
        self.accounts = accounts;
        Ok(out)
    }
}

fn load_document<T>(db: &Database, key: &str) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match db.get_blob(key)? {
        Some(json) => serde_json::from_str(&json).with_context(|| format!("corrupt document {key}")),
        None => Ok(T::default()),
    }
}
