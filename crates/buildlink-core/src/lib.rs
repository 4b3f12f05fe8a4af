//! Domain logic of the BuildLink portal.
//!
//! [`Portal`] owns the account directory, the conversation store and the
//! blob database they are persisted to. Every mutation goes through it and is
//! flushed before the call returns.

pub mod accounts;
pub mod conversations;
pub mod error;
pub mod password;
pub mod portal;
pub mod session;

pub use accounts::{
    AccountDirectory, ArchitectProfileUpdate, PreparedRegistration, RegistrationForm,
};
pub use conversations::{ConversationStore, ResolvedThread};
pub use error::{AccountError, MessagingError, PortalError};
pub use portal::{InboxEntry, Portal, SentMessage, Thread};
