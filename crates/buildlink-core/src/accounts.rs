use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use buildlink_types::models::{Account, Profile, Role, VerificationStatus};

use crate::error::AccountError;
use crate::password::{self, PasswordRequirements};

/// Registration form as submitted.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

/// A registration whose form checks passed, password already hashed.
/// Email uniqueness is checked when it is inserted.
#[derive(Debug, Clone)]
pub struct PreparedRegistration {
    email: String,
    password_hash: String,
    role: Role,
}

impl RegistrationForm {
    /// Field checks in order (missing, mismatch, policy), then hashing.
    pub fn prepare(self) -> Result<PreparedRegistration, AccountError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(AccountError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }
        if !PasswordRequirements::check(&self.password).all_met() {
            return Err(AccountError::WeakPassword);
        }

        Ok(PreparedRegistration {
            email: email.to_string(),
            password_hash: password::hash_password(&self.password)?,
            role: self.role,
        })
    }
}

/// Editable fields of an architect's public profile.
#[derive(Debug, Clone, Default)]
pub struct ArchitectProfileUpdate {
    pub name: String,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
}

/// Every registered account, in registration order. Accounts are never
/// removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    fn get_mut(&mut self, email: &str) -> Result<&mut Account, AccountError> {
        self.accounts
            .iter_mut()
            .find(|a| a.email == email)
            .ok_or(AccountError::UnknownUser)
    }

    /// The "find an architect" directory.
    pub fn architects(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.is_architect())
    }

    pub fn register(&mut self, form: RegistrationForm) -> Result<Account, AccountError> {
        self.insert(form.prepare()?)
    }

    /// Add a prepared registration. Fails if the email is already taken.
    pub fn insert(&mut self, prepared: PreparedRegistration) -> Result<Account, AccountError> {
        if self.get(&prepared.email).is_some() {
            return Err(AccountError::EmailTaken);
        }

        let account = Account {
            name: default_display_name(&prepared.email),
            email: prepared.email,
            password_hash: prepared.password_hash,
            created_at: Utc::now(),
            profile: Profile::for_role(prepared.role),
        };

        info!("Registered {:?} account {}", account.role(), account.email);
        self.accounts.push(account.clone());
        Ok(account)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<&Account, AccountError> {
        let account = self.login_candidate(email, password)?;
        if !password::verify_password(password, &account.password_hash) {
            return Err(AccountError::IncorrectPassword);
        }
        Ok(account)
    }

    /// The account `login` would check the password against, after the blank
    /// field and unknown user checks.
    pub fn login_candidate(&self, email: &str, password: &str) -> Result<&Account, AccountError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields);
        }
        self.get(email).ok_or(AccountError::UnknownUser)
    }

    /// Change the display name. The email cannot be changed.
    pub fn update_settings(&mut self, email: &str, name: &str) -> Result<Account, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::MissingFields);
        }
        let account = self.get_mut(email)?;
        account.name = name.to_string();
        Ok(account.clone())
    }

    pub fn update_architect_profile(
        &mut self,
        email: &str,
        update: ArchitectProfileUpdate,
    ) -> Result<Account, AccountError> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(AccountError::MissingFields);
        }
        let account = self.get_mut(email)?;
        let profile = account.architect_mut().ok_or(AccountError::NotAnArchitect)?;
        profile.specialty = non_blank(update.specialty);
        profile.bio = non_blank(update.bio);
        profile.image_url = non_blank(update.image_url);
        account.name = name.to_string();
        Ok(account.clone())
    }

    /// `unverified -> pending`. A second submission is rejected rather than
    /// ignored.
    pub fn submit_verification(&mut self, email: &str) -> Result<Account, AccountError> {
        let account = self.get_mut(email)?;
        let profile = account
            .architect_mut()
            .ok_or(AccountError::VerificationNotApplicable)?;
        match profile.verification {
            VerificationStatus::Unverified => profile.verification = VerificationStatus::Pending,
            VerificationStatus::Pending => return Err(AccountError::VerificationPending),
            VerificationStatus::Verified => return Err(AccountError::AlreadyVerified),
        }
        info!("Verification submitted for {}", account.email);
        Ok(account.clone())
    }

    /// `pending -> verified`. Called by whoever reviews submissions; nothing
    /// in the portal itself triggers it.
    pub fn mark_verified(&mut self, email: &str) -> Result<Account, AccountError> {
        let account = self.get_mut(email)?;
        let profile = account
            .architect_mut()
            .ok_or(AccountError::VerificationNotApplicable)?;
        match profile.verification {
            VerificationStatus::Pending => profile.verification = VerificationStatus::Verified,
            VerificationStatus::Unverified => return Err(AccountError::VerificationNotSubmitted),
            VerificationStatus::Verified => return Err(AccountError::AlreadyVerified),
        }
        info!("{} is now verified", account.email);
        Ok(account.clone())
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "Secur3!";

    fn form(email: &str, role: Role) -> RegistrationForm {
        RegistrationForm {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
            role,
        }
    }

    #[test]
    fn register_fills_defaults() {
        let mut dir = AccountDirectory::new();
        let client = dir.register(form("jane@x.com", Role::Client)).unwrap();
        assert_eq!(client.name, "jane");
        assert_eq!(client.role(), Role::Client);
        assert_eq!(client.verification(), None);
        assert_ne!(client.password_hash, PASSWORD);

        let arch = dir.register(form("ida@x.com", Role::Architect)).unwrap();
        assert_eq!(arch.verification(), Some(VerificationStatus::Unverified));
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn register_validates_in_order() {
        let mut dir = AccountDirectory::new();

        let mut f = form("", Role::Client);
        assert_eq!(dir.register(f.clone()).unwrap_err(), AccountError::MissingFields);

        f.email = "jane@x.com".into();
        f.confirm_password = "Other1!".into();
        assert_eq!(dir.register(f.clone()).unwrap_err(), AccountError::PasswordMismatch);

        f.password = "weak".into();
        f.confirm_password = "weak".into();
        assert_eq!(dir.register(f).unwrap_err(), AccountError::WeakPassword);
        assert!(dir.is_empty());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut dir = AccountDirectory::new();
        dir.register(form("jane@x.com", Role::Client)).unwrap();
        assert_eq!(
            dir.register(form("jane@x.com", Role::Architect)).unwrap_err(),
            AccountError::EmailTaken
        );
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn login_distinguishes_failures() {
        let mut dir = AccountDirectory::new();
        dir.register(form("jane@x.com", Role::Client)).unwrap();

        assert_eq!(dir.login("jane@x.com", PASSWORD).unwrap().email, "jane@x.com");
        assert_eq!(
            dir.login("nobody@x.com", PASSWORD).unwrap_err(),
            AccountError::UnknownUser
        );
        assert_eq!(
            dir.login("jane@x.com", "Wrong1!").unwrap_err(),
            AccountError::IncorrectPassword
        );
        assert_eq!(dir.login("jane@x.com", "").unwrap_err(), AccountError::MissingFields);
    }

    #[test]
    fn settings_change_name_only() {
        let mut dir = AccountDirectory::new();
        dir.register(form("jane@x.com", Role::Client)).unwrap();
        let updated = dir.update_settings("jane@x.com", "Jane Doe").unwrap();
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.email, "jane@x.com");
        assert_eq!(
            dir.update_settings("jane@x.com", "  ").unwrap_err(),
            AccountError::MissingFields
        );
    }

    #[test]
    fn architect_profile_update() {
        let mut dir = AccountDirectory::new();
        dir.register(form("ida@x.com", Role::Architect)).unwrap();
        dir.register(form("jane@x.com", Role::Client)).unwrap();

        let updated = dir
            .update_architect_profile(
                "ida@x.com",
                ArchitectProfileUpdate {
                    name: "Ida".into(),
                    specialty: Some("Sustainable housing".into()),
                    bio: Some("  ".into()),
                    image_url: None,
                },
            )
            .unwrap();
        let profile = updated.architect().unwrap();
        assert_eq!(updated.name, "Ida");
        assert_eq!(profile.specialty.as_deref(), Some("Sustainable housing"));
        assert_eq!(profile.bio, None);

        let err = dir
            .update_architect_profile(
                "jane@x.com",
                ArchitectProfileUpdate {
                    name: "Jane".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, AccountError::NotAnArchitect);
    }

    #[test]
    fn verification_moves_forward_only() {
        let mut dir = AccountDirectory::new();
        dir.register(form("ida@x.com", Role::Architect)).unwrap();

        assert_eq!(
            dir.mark_verified("ida@x.com").unwrap_err(),
            AccountError::VerificationNotSubmitted
        );

        let pending = dir.submit_verification("ida@x.com").unwrap();
        assert_eq!(pending.verification(), Some(VerificationStatus::Pending));
        assert_eq!(
            dir.submit_verification("ida@x.com").unwrap_err(),
            AccountError::VerificationPending
        );
        assert_eq!(
            dir.get("ida@x.com").unwrap().verification(),
            Some(VerificationStatus::Pending)
        );

        let verified = dir.mark_verified("ida@x.com").unwrap();
        assert_eq!(verified.verification(), Some(VerificationStatus::Verified));
        assert_eq!(
            dir.submit_verification("ida@x.com").unwrap_err(),
            AccountError::AlreadyVerified
        );
    }

    #[test]
    fn clients_have_no_verification() {
        let mut dir = AccountDirectory::new();
        dir.register(form("jane@x.com", Role::Client)).unwrap();
        assert_eq!(
            dir.submit_verification("jane@x.com").unwrap_err(),
            AccountError::VerificationNotApplicable
        );
    }

    #[test]
    fn architects_lists_only_architects() {
        let mut dir = AccountDirectory::new();
        dir.register(form("jane@x.com", Role::Client)).unwrap();
        dir.register(form("ida@x.com", Role::Architect)).unwrap();
        dir.register(form("leo@x.com", Role::Architect)).unwrap();

        let emails: Vec<_> = dir.architects().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, ["ida@x.com", "leo@x.com"]);
    }
}
