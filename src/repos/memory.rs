//! In-memory `UserStore` for tests. Counts calls so tests can assert the store was never
//! reached after a denial.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::authz::{Role, UserId};
use crate::repos::error::RepoError;
use crate::repos::user_repo::{User, UserChanges, UserStore};

#[derive(Debug, Default, Clone)]
pub struct MemoryUserStore {
    users: Arc<Mutex<BTreeMap<UserId, User>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryUserStore {
    pub fn with_users(users: &[(UserId, Role)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.users.lock().unwrap();
            for (id, role) in users {
                let now = Utc::now();
                map.insert(
                    *id,
                    User {
                        id: *id,
                        email: format!("user{id}@example.com"),
                        name: format!("User {id}"),
                        role: *role,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        store
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, RepoError> {
        self.touch();
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_by_id(&self, id: UserId) -> Result<User, RepoError> {
        self.touch();
        self.get(id).ok_or(RepoError::NotFound)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepoError> {
        self.touch();
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &changes.email
            && users.values().any(|u| u.id != id && &u.email == email)
        {
            return Err(RepoError::Conflict);
        }

        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        self.touch();
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}
