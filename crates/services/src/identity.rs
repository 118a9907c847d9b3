use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use quest_core::model::UserId;
use storage::repository::{AccountRepository, StorageError, StoredAccount};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AuthError;

const MIN_PASSWORD_LEN: usize = 6;

/// Authenticated user as seen by the quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

/// Identity/session provider the quest delegates authentication to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Watch sign-in state changes. The receiver starts at the current value.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountCreation` if the account cannot be created.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Clear the signed-in identity.
    ///
    /// # Errors
    ///
    /// Providers backed by a remote service may fail; the local one never does.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Email/password provider over an `AccountRepository`.
///
/// Passwords are kept only as bcrypt hashes. Emails are matched
/// case-insensitively. The signed-in identity lives in this process; the
/// accounts live as long as the repository does.
pub struct AccountIdentityProvider {
    accounts: Arc<dyn AccountRepository>,
    hash_cost: u32,
    current: watch::Sender<Option<Identity>>,
}

impl AccountIdentityProvider {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        let (current, _rx) = watch::channel(None);
        Self {
            accounts,
            hash_cost: DEFAULT_COST,
            current,
        }
    }

    /// Override the bcrypt cost used for new accounts (4..=31).
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn publish(&self, identity: Option<Identity>) {
        self.current.send_replace(identity);
    }
}

#[async_trait]
impl IdentityProvider for AccountIdentityProvider {
    fn current_user(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = Self::normalize(email);
        let account = self
            .accounts
            .find_account(&key)
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        // A malformed stored hash counts as a mismatch.
        if !verify(password, &account.password_hash).unwrap_or(false) {
            tracing::warn!(email = %key, "failed sign-in: invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            user_id: account.user_id,
            email: account.email,
        };
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = Self::normalize(email);
        if !key.contains('@') || key.starts_with('@') || key.ends_with('@') {
            return Err(AuthError::AccountCreation("invalid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::AccountCreation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash(password, self.hash_cost)
            .map_err(|e| AuthError::AccountCreation(e.to_string()))?;
        let user_id = UserId::new(Uuid::new_v4().simple().to_string())
            .map_err(|e| AuthError::AccountCreation(e.to_string()))?;
        let account = StoredAccount {
            email: key,
            user_id,
            password_hash,
        };

        self.accounts
            .insert_account(&account)
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => {
                    AuthError::AccountCreation("email already in use".into())
                }
                other => AuthError::AccountCreation(other.to_string()),
            })?;

        let identity = Identity {
            user_id: account.user_id,
            email: account.email,
        };
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.publish(None);
        Ok(())
    }
}
