use thiserror::Error;

/// Validation failures around accounts. The display text is shown to the
/// user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Please fill in all fields.")]
    MissingFields,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Please ensure your password meets all the requirements.")]
    WeakPassword,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("User not found. Please register.")]
    UnknownUser,

    #[error("Incorrect password.")]
    IncorrectPassword,

    #[error("Only architects have a professional profile.")]
    NotAnArchitect,

    #[error("Only architects can submit verification.")]
    VerificationNotApplicable,

    #[error("Verification is already pending review.")]
    VerificationPending,

    #[error("This account is already verified.")]
    AlreadyVerified,

    #[error("Verification has not been submitted.")]
    VerificationNotSubmitted,

    #[error("Failed to secure password.")]
    Hashing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MessagingError {
    #[error("Message cannot be empty.")]
    EmptyBody,

    #[error("Recipient not found.")]
    UnknownRecipient,

    #[error("You cannot message yourself.")]
    SelfMessage,

    #[error("Conversation not found.")]
    ConversationNotFound,
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.into())
    }
}
