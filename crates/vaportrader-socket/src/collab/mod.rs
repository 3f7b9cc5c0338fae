//! Collaborator contracts.
//!
//! The socket client does not own persistence or the catalog API; it only
//! needs "id in, record or not-found out". Implementations live with the
//! application. `InMemoryUserDirectory` backs the demo binary and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use vaportrader_core::error::Result;

/// Local user record as far as the socket client cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    /// Internal id.
    pub id: String,
    /// Market user id, once the account is linked.
    pub external_id: Option<String>,
    pub market_username: Option<String>,
    pub locale: Option<String>,
}

/// Public market profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub ingame_name: String,
    pub locale: String,
    pub platform: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>>;
    async fn user_by_id(&self, id: &str) -> Result<Option<UserRecord>>;
    /// Create or update; returns the stored record.
    async fn save_user(&self, user: UserRecord) -> Result<UserRecord>;
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>>;
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.value().external_id.as_deref() == Some(external_id))
            .map(|u| u.value().clone()))
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn save_user(&self, user: UserRecord) -> Result<UserRecord> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_lookup_both_ways() {
        let dir = InMemoryUserDirectory::new();
        assert!(dir.user_by_id("1").await.unwrap().is_none());

        dir.save_user(UserRecord {
            id: "1".into(),
            external_id: Some("u-42".into()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(dir.user_by_external_id("u-42").await.unwrap().unwrap().id, "1");
        assert!(dir.user_by_external_id("u-43").await.unwrap().is_none());

        let mut linked = dir.user_by_id("1").await.unwrap().unwrap();
        linked.market_username = Some("Tenno".into());
        dir.save_user(linked).await.unwrap();
        assert_eq!(
            dir.user_by_id("1").await.unwrap().unwrap().market_username.as_deref(),
            Some("Tenno")
        );
    }
}
