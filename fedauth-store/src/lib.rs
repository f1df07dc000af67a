//! # Fedauth Store
//!
//! Profile persistence for the fedauth toolkit: one [`ProfileRecord`] per
//! internal identity, written through a merge-upsert that sets `created_at`
//! exactly once and `updated_at` on every successful write.
//!
//! Two backends are provided: an in-memory store (tests, single-process
//! deployments) and a feature-gated SQL store backed by `sqlx`.

#![warn(missing_docs)]

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fedauth_core::{ExternalProfile, FederationError, InternalIdentity, Provider};
use serde::{Deserialize, Serialize};

pub mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "store-sqlx")]
pub mod sql_store;
#[cfg(feature = "store-sqlx")]
pub use sql_store::SqlStore;

/// The persisted profile document for one internal identity.
///
/// Optional fields hold `None` where the provider did not supply a value;
/// serialized they become explicit nulls, never absent keys. `created_at` is
/// immutable after the first write; `updated_at` tracks the most recent
/// login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// The namespaced identity string, also the document key.
    pub uid: InternalIdentity,
    /// The provider that owns this identity.
    pub provider: Provider,
    /// The provider-assigned raw user id.
    pub external_id: String,
    /// Account email, or null.
    pub email: Option<String>,
    /// Display name, or null.
    pub display_name: Option<String>,
    /// Profile image URL, or null.
    pub avatar_url: Option<String>,
    /// Provider-specific attributes, each stored as a value or null.
    pub extras: BTreeMap<String, Option<String>>,
    /// Set once, at the first successful upsert.
    pub created_at: DateTime<Utc>,
    /// Set on every successful upsert.
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Build a fresh record for a first login at `now`.
    pub fn first_login(
        uid: InternalIdentity,
        profile: &ExternalProfile,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            provider: profile.provider,
            external_id: profile.external_id.clone(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            extras: profile.extras.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a fresh verification into this record at `now`.
    ///
    /// Canonical fields are overwritten (with null where the provider dropped
    /// a value); extras are merged key-wise, leaving keys the new profile
    /// does not mention untouched. `created_at` is carried forward unchanged.
    pub fn merged_with(mut self, profile: &ExternalProfile, now: DateTime<Utc>) -> Self {
        self.provider = profile.provider;
        self.external_id = profile.external_id.clone();
        self.email = profile.email.clone();
        self.display_name = profile.display_name.clone();
        self.avatar_url = profile.avatar_url.clone();
        for (key, value) in &profile.extras {
            self.extras.insert(key.clone(), value.clone());
        }
        self.updated_at = now;
        self
    }
}

/// Trait for a keyed profile document store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert-or-merge the profile under `uid` and return the merged record
    /// after the write is durable.
    ///
    /// Implementations must be atomic with respect to the `created_at`
    /// invariant: two concurrent first logins for the same identity must not
    /// both observe an absent prior record.
    async fn upsert(
        &self,
        uid: &InternalIdentity,
        profile: &ExternalProfile,
    ) -> Result<ProfileRecord, FederationError>;

    /// Load the record for `uid`, if one exists.
    async fn load(&self, uid: &InternalIdentity) -> Result<Option<ProfileRecord>, FederationError>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for std::sync::Arc<T> {
    async fn upsert(
        &self,
        uid: &InternalIdentity,
        profile: &ExternalProfile,
    ) -> Result<ProfileRecord, FederationError> {
        (**self).upsert(uid, profile).await
    }

    async fn load(&self, uid: &InternalIdentity) -> Result<Option<ProfileRecord>, FederationError> {
        (**self).load(uid).await
    }
}
