//! In-memory profile store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use fedauth_core::{ExternalProfile, FederationError, InternalIdentity};
use tokio::sync::Mutex;

use crate::{ProfileRecord, ProfileStore};

/// A profile store backed by a process-local map.
///
/// A single lock covers the read-merge-write sequence, so concurrent first
/// logins for the same identity agree on `created_at`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.profiles.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert(
        &self,
        uid: &InternalIdentity,
        profile: &ExternalProfile,
    ) -> Result<ProfileRecord, FederationError> {
        let now = Utc::now();
        let mut profiles = self.profiles.lock().await;
        let record = match profiles.remove(uid.as_str()) {
            Some(existing) => existing.merged_with(profile, now),
            None => ProfileRecord::first_login(uid.clone(), profile, now),
        };
        profiles.insert(uid.as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn load(&self, uid: &InternalIdentity) -> Result<Option<ProfileRecord>, FederationError> {
        Ok(self.profiles.lock().await.get(uid.as_str()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use fedauth_core::Provider;

    use super::*;

    fn naver_profile(nickname: &str) -> ExternalProfile {
        let mut extras = BTreeMap::new();
        extras.insert("gender".to_string(), Some("F".to_string()));
        extras.insert("mobile".to_string(), None);
        ExternalProfile {
            provider: Provider::Naver,
            external_id: "12345".to_string(),
            email: Some("a@example.com".to_string()),
            display_name: Some(nickname.to_string()),
            avatar_url: None,
            extras,
        }
    }

    #[tokio::test]
    async fn first_upsert_creates_record() {
        let store = MemoryStore::new();
        let uid = InternalIdentity::map(Provider::Naver, "12345").unwrap();

        let record = store.upsert(&uid, &naver_profile("alice")).await.unwrap();
        assert_eq!(record.uid, uid);
        assert_eq!(record.email.as_deref(), Some("a@example.com"));
        assert_eq!(record.created_at, record.updated_at);
        // Absent provider values are stored as explicit nulls.
        assert_eq!(record.extras.get("mobile"), Some(&None));
    }

    #[tokio::test]
    async fn second_upsert_merges_and_keeps_created_at() {
        let store = MemoryStore::new();
        let uid = InternalIdentity::map(Provider::Naver, "12345").unwrap();

        let first = store.upsert(&uid, &naver_profile("alice")).await.unwrap();
        let second = store.upsert(&uid, &naver_profile("alicia")).await.unwrap();

        assert_eq!(second.display_name.as_deref(), Some("alicia"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn repeated_upsert_is_idempotent_apart_from_updated_at() {
        let store = MemoryStore::new();
        let uid = InternalIdentity::map(Provider::Naver, "12345").unwrap();
        let profile = naver_profile("alice");

        let first = store.upsert(&uid, &profile).await.unwrap();
        let second = store.upsert(&uid, &profile).await.unwrap();

        let mut normalized = second.clone();
        normalized.updated_at = first.updated_at;
        assert_eq!(normalized, first);
    }

    #[tokio::test]
    async fn merge_leaves_unmentioned_extras_untouched() {
        let store = MemoryStore::new();
        let uid = InternalIdentity::map(Provider::Naver, "12345").unwrap();

        store.upsert(&uid, &naver_profile("alice")).await.unwrap();

        let mut sparse = naver_profile("alice");
        sparse.extras = BTreeMap::from([("age".to_string(), Some("20-29".to_string()))]);
        let record = store.upsert(&uid, &sparse).await.unwrap();

        assert_eq!(record.extras.get("age"), Some(&Some("20-29".to_string())));
        assert_eq!(record.extras.get("gender"), Some(&Some("F".to_string())));
    }

    #[tokio::test]
    async fn concurrent_first_logins_agree_on_created_at() {
        let store = Arc::new(MemoryStore::new());
        let uid = InternalIdentity::map(Provider::Naver, "12345").unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let uid = uid.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(&uid, &naver_profile("alice")).await.unwrap()
            }));
        }

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap().created_at);
        }
        assert!(created.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn different_identities_do_not_interfere() {
        let store = MemoryStore::new();
        let naver = InternalIdentity::map(Provider::Naver, "42").unwrap();
        let kakao = InternalIdentity::map(Provider::Kakao, "42").unwrap();

        let mut kakao_profile = naver_profile("bob");
        kakao_profile.provider = Provider::Kakao;
        kakao_profile.external_id = "42".to_string();
        let mut naver_profile = naver_profile("alice");
        naver_profile.external_id = "42".to_string();

        store.upsert(&naver, &naver_profile).await.unwrap();
        store.upsert(&kakao, &kakao_profile).await.unwrap();

        assert_eq!(store.len().await, 2);
        let loaded = store.load(&naver).await.unwrap().unwrap();
        assert_eq!(loaded.display_name.as_deref(), Some("alice"));
    }
}
