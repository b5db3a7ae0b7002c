use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::users::{
    repo::{UserStore, UsernameTaken},
    repo_types::{NewUser, User},
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

/// Process-local store. Ids are never reused, even after removal.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn add(&self, user: NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.write().await;
        if inner.rows.values().any(|u| u.username == user.username) {
            return Err(UsernameTaken.into());
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: inner.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            auth_token: user.auth_token,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update(&self, user: &User) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        if inner
            .rows
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(UsernameTaken.into());
        }
        match inner.rows.get_mut(&user.id) {
            Some(row) => {
                *row = User {
                    updated_at: OffsetDateTime::now_utc(),
                    created_at: row.created_at,
                    ..user.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.inner.read().await.rows.len() as i64)
    }

    async fn get_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: "hash".into(),
            auth_token: String::new(),
        }
    }

    #[tokio::test]
    async fn add_assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let a = store.add(new_user("alice")).await.unwrap();
        let b = store.add(new_user("bob")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_remove() {
        let store = MemoryUserStore::new();
        let a = store.add(new_user("alice")).await.unwrap();
        assert!(store.remove(a.id).await.unwrap());
        let b = store.add(new_user("bob")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn find_and_find_by_username() {
        let store = MemoryUserStore::new();
        let a = store.add(new_user("alice")).await.unwrap();
        assert_eq!(store.find(a.id).await.unwrap().unwrap().username, "alice");
        assert_eq!(
            store.find_by_username("alice").await.unwrap().unwrap().id,
            a.id
        );
        assert!(store.find(99).await.unwrap().is_none());
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_username_follows_renames_and_removals() {
        let store = MemoryUserStore::new();
        let mut a = store.add(new_user("alice")).await.unwrap();
        store.add(new_user("bob")).await.unwrap();
        a.username = "alicia".into();
        assert!(store.update(&a).await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
        assert_eq!(
            store.find_by_username("alicia").await.unwrap().unwrap().id,
            a.id
        );
        store.remove(a.id).await.unwrap();
        assert!(store.find_by_username("alicia").await.unwrap().is_none());
        assert!(store.find_by_username("bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn add_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.add(new_user("alice")).await.unwrap();
        let err = store.add(new_user("alice")).await.unwrap_err();
        assert!(err.downcast_ref::<UsernameTaken>().is_some());
    }

    #[tokio::test]
    async fn update_overwrites_and_keeps_created_at() {
        let store = MemoryUserStore::new();
        let mut a = store.add(new_user("alice")).await.unwrap();
        let created_at = a.created_at;
        a.email = "new@example.com".into();
        assert!(store.update(&a).await.unwrap());
        let stored = store.find(a.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "new@example.com");
        assert_eq!(stored.created_at, created_at);
    }

    #[tokio::test]
    async fn update_and_remove_missing_return_false() {
        let store = MemoryUserStore::new();
        let mut ghost = store.add(new_user("ghost")).await.unwrap();
        store.remove(ghost.id).await.unwrap();
        ghost.email = "x@example.com".into();
        assert!(!store.update(&ghost).await.unwrap());
        assert!(!store.remove(ghost.id).await.unwrap());
    }
}
