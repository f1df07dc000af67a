//! SQL-backed profile store.
//!
//! The upsert is a single `INSERT … ON CONFLICT` statement, so `created_at`
//! is written exactly once even under concurrent first logins; the conflict
//! branch never touches it. Expected schema (adjust types per database):
//!
//! ```sql
//! CREATE TABLE fedauth_profiles (
//!     uid TEXT PRIMARY KEY,
//!     provider TEXT NOT NULL,
//!     external_id TEXT NOT NULL,
//!     email TEXT,
//!     display_name TEXT,
//!     avatar_url TEXT,
//!     extras TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fedauth_core::{ExternalProfile, FederationError, InternalIdentity, Provider};
use sqlx::Database;

use crate::ProfileRecord;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use crate::ProfileStore;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use async_trait::async_trait;

/// A profile store backed by a `sqlx` connection pool.
#[derive(Clone, Debug)]
pub struct SqlStore<DB: Database> {
    pool: sqlx::Pool<DB>,
    table_name: String,
}

impl<DB: Database> SqlStore<DB> {
    /// Create a store writing to the default `fedauth_profiles` table.
    pub fn new(pool: sqlx::Pool<DB>) -> Self {
        Self {
            pool,
            table_name: "fedauth_profiles".to_string(),
        }
    }

    /// Create a store writing to a custom table.
    pub fn with_table_name(pool: sqlx::Pool<DB>, table_name: String) -> Self {
        Self { pool, table_name }
    }
}

type ProfileRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const PROFILE_COLUMNS: &str =
    "uid, provider, external_id, email, display_name, avatar_url, extras, created_at, updated_at";

fn row_to_record(row: ProfileRow) -> Result<ProfileRecord, FederationError> {
    let (_uid, provider, external_id, email, display_name, avatar_url, extras_json, created_at, updated_at) =
        row;
    let provider: Provider = provider.parse()?;
    let uid = InternalIdentity::map(provider, &external_id)?;
    let extras: BTreeMap<String, Option<String>> = serde_json::from_str(&extras_json)
        .map_err(|e| FederationError::Store(format!("extras deserialization error: {e}")))?;
    Ok(ProfileRecord {
        uid,
        provider,
        external_id,
        email,
        display_name,
        avatar_url,
        extras,
        created_at,
        updated_at,
    })
}

fn extras_json(profile: &ExternalProfile) -> Result<String, FederationError> {
    serde_json::to_string(&profile.extras)
        .map_err(|e| FederationError::Store(format!("extras serialization error: {e}")))
}

// A uid is provider-namespaced, so a record's extras always come from a
// single provider with a fixed key set; overwriting the extras column is
// therefore equivalent to a key-wise merge.

#[cfg(feature = "postgres")]
#[async_trait]
impl ProfileStore for SqlStore<sqlx::Postgres> {
    async fn upsert(
        &self,
        uid: &InternalIdentity,
        profile: &ExternalProfile,
    ) -> Result<ProfileRecord, FederationError> {
        let query = format!(
            "INSERT INTO {table} ({columns})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             ON CONFLICT (uid) DO UPDATE SET
             email = EXCLUDED.email,
             display_name = EXCLUDED.display_name,
             avatar_url = EXCLUDED.avatar_url,
             extras = EXCLUDED.extras,
             updated_at = EXCLUDED.updated_at
             RETURNING {columns}",
            table = self.table_name,
            columns = PROFILE_COLUMNS,
        );
        let now = Utc::now();

        let row: ProfileRow = sqlx::query_as(&query)
            .bind(uid.as_str())
            .bind(profile.provider.as_str())
            .bind(&profile.external_id)
            .bind(&profile.email)
            .bind(&profile.display_name)
            .bind(&profile.avatar_url)
            .bind(extras_json(profile)?)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FederationError::Store(format!("Postgres upsert error: {e}")))?;

        row_to_record(row)
    }

    async fn load(&self, uid: &InternalIdentity) -> Result<Option<ProfileRecord>, FederationError> {
        let query = format!(
            "SELECT {columns} FROM {table} WHERE uid = $1",
            table = self.table_name,
            columns = PROFILE_COLUMNS,
        );

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FederationError::Store(format!("Postgres load error: {e}")))?;

        row.map(row_to_record).transpose()
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl ProfileStore for SqlStore<sqlx::Sqlite> {
    async fn upsert(
        &self,
        uid: &InternalIdentity,
        profile: &ExternalProfile,
    ) -> Result<ProfileRecord, FederationError> {
        let query = format!(
            "INSERT INTO {table} ({columns})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT (uid) DO UPDATE SET
             email = excluded.email,
             display_name = excluded.display_name,
             avatar_url = excluded.avatar_url,
             extras = excluded.extras,
             updated_at = excluded.updated_at
             RETURNING {columns}",
            table = self.table_name,
            columns = PROFILE_COLUMNS,
        );
        let now = Utc::now();

        let row: ProfileRow = sqlx::query_as(&query)
            .bind(uid.as_str())
            .bind(profile.provider.as_str())
            .bind(&profile.external_id)
            .bind(&profile.email)
            .bind(&profile.display_name)
            .bind(&profile.avatar_url)
            .bind(extras_json(profile)?)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FederationError::Store(format!("Sqlite upsert error: {e}")))?;

        row_to_record(row)
    }

    async fn load(&self, uid: &InternalIdentity) -> Result<Option<ProfileRecord>, FederationError> {
        let query = format!(
            "SELECT {columns} FROM {table} WHERE uid = ?1",
            table = self.table_name,
            columns = PROFILE_COLUMNS,
        );

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FederationError::Store(format!("Sqlite load error: {e}")))?;

        row.map(row_to_record).transpose()
    }
}
