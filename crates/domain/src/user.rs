//! User authority service.

use common::{NewUser, User, UserId};
use store::{StoreError, UserStore};

use crate::error::DomainError;

/// Owns user records: creation and lookup.
pub struct UserService<S: UserStore> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    /// Creates a new user service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user. Every call creates a new record with a fresh id.
    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: NewUser) -> Result<User, DomainError> {
        validate_new_user(&user)?;

        let user = self.store.insert_user(user).await.map_err(|e| match e {
            StoreError::UniqueViolation { .. } => {
                DomainError::Invalid("email already registered".to_string())
            }
            other => other.into(),
        })?;

        metrics::counter!("records_created_total", "entity" => "user").increment(1);
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Loads a user by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        Ok(self.store.get_user(id).await?)
    }

    /// Lists all users.
    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.store.list_users().await?)
    }
}

fn validate_new_user(user: &NewUser) -> Result<(), DomainError> {
    if user.name.trim().is_empty() {
        return Err(DomainError::Invalid("name is required".to_string()));
    }
    if user.email.trim().is_empty() {
        return Err(DomainError::Invalid("email is required".to_string()));
    }
    if !user.email.contains('@') {
        return Err(DomainError::Invalid(format!(
            "invalid email address: {}",
            user.email
        )));
    }
    Ok(())
}
