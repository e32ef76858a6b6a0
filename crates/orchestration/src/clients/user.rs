//! User service contract, its HTTP client and an in-memory double.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::{NewUser, ServiceError, ServiceLocation, User, UserId};

use super::http::HttpTransport;

/// Operations offered by the user authority.
#[async_trait]
pub trait UserAuthority: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError>;

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError>;

    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
}

/// Calls one resolved user service instance.
#[derive(Clone)]
pub struct HttpUserClient {
    transport: HttpTransport,
}

impl HttpUserClient {
    pub fn new(client: reqwest::Client, location: ServiceLocation) -> Self {
        Self {
            transport: HttpTransport::new(client, location),
        }
    }
}

#[async_trait]
impl UserAuthority for HttpUserClient {
    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        self.transport.post("/users", &user).await
    }

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.transport.get(&format!("/users/{id}")).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.transport.get("/users").await
    }
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    users: BTreeMap<UserId, User>,
    next_id: i64,
    unavailable: bool,
    lookups: usize,
}

/// In-memory user authority for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserAuthority {
    state: Arc<Mutex<InMemoryUserState>>,
}

impl InMemoryUserAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of `get_user` calls received so far.
    pub fn lookup_count(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryUserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unavailable() -> ServiceError {
    ServiceError::unavailable("no healthy instances of service user-authority found")
}

#[async_trait]
impl UserAuthority for InMemoryUserAuthority {
    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(unavailable());
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::invalid_argument("email already registered"));
        }

        state.next_id += 1;
        let user = User {
            id: UserId::new(state.next_id),
            name: user.name,
            email: user.email,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        let mut state = self.lock();
        state.lookups += 1;
        if state.unavailable {
            return Err(unavailable());
        }
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("user {id} not found")))
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let state = self.lock();
        if state.unavailable {
            return Err(unavailable());
        }
        Ok(state.users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ErrorKind;

    fn alice() -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let users = InMemoryUserAuthority::new();
        let created = users.create_user(alice()).await.unwrap();
        assert_eq!(created.id, UserId::new(1));

        let fetched = users.get_user(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(users.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_user() {
        let users = InMemoryUserAuthority::new();
        let err = users.get_user(UserId::new(999)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "user 999 not found");
    }

    #[tokio::test]
    async fn test_unavailable_switch() {
        let users = InMemoryUserAuthority::new();
        users.create_user(alice()).await.unwrap();
        users.set_unavailable(true);

        let err = users.get_user(UserId::new(1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);

        users.set_unavailable(false);
        assert!(users.get_user(UserId::new(1)).await.is_ok());
    }
}
