// ABOUTME: Provider link database operations
// ABOUTME: Binds local users to provider identities, unique on (provider, provider_user_id)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{from_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{ProviderLink, ProviderTokenUpdate};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const LINK_COLUMNS: &str = "id, user_id, provider, provider_user_id, email, name, avatar_url, \
     access_token, refresh_token, token_expires_at, raw_profile, created_at, updated_at";

impl Database {
    /// Create the provider links table
    pub(super) async fn migrate_provider_links(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS provider_links (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                provider TEXT NOT NULL,
                provider_user_id TEXT NOT NULL,
                email TEXT,
                name TEXT,
                avatar_url TEXT,
                access_token TEXT,
                refresh_token TEXT,
                token_expires_at INTEGER,
                raw_profile TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (provider, provider_user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_provider_links_user_id ON provider_links(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new provider link
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the provider identity is already linked
    pub async fn create_provider_link(&self, link: &ProviderLink) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO provider_links (id, user_id, provider, provider_user_id, email, name,
                                        avatar_url, access_token, refresh_token, token_expires_at,
                                        raw_profile, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(link.id.to_string())
        .bind(link.user_id.to_string())
        .bind(&link.provider)
        .bind(&link.provider_user_id)
        .bind(&link.email)
        .bind(&link.name)
        .bind(&link.avatar_url)
        .bind(&link.access_token)
        .bind(&link.refresh_token)
        .bind(link.token_expires_at.map(|t| t.timestamp()))
        .bind(link.raw_profile.to_string())
        .bind(link.created_at.timestamp())
        .bind(link.updated_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find the link for a provider identity
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_provider_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<Option<ProviderLink>> {
        let row = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM provider_links WHERE provider = ? AND provider_user_id = ?"
        ))
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_provider_link).transpose()
    }

    /// List all provider links of a user
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_provider_links_for_user(&self, user_id: Uuid) -> AppResult<Vec<ProviderLink>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM provider_links WHERE user_id = ? ORDER BY created_at, rowid"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_provider_link).collect()
    }

    /// Store fresh provider tokens and profile snapshot on an existing link
    ///
    /// A `None` refresh token keeps the stored one; providers only return it on consent.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn update_provider_link_tokens(
        &self,
        link_id: Uuid,
        update: &ProviderTokenUpdate,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE provider_links
            SET access_token = ?,
                refresh_token = COALESCE(?, refresh_token),
                token_expires_at = ?,
                email = COALESCE(?, email),
                name = COALESCE(?, name),
                avatar_url = COALESCE(?, avatar_url),
                raw_profile = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.access_token)
        .bind(&update.refresh_token)
        .bind(update.token_expires_at.map(|t| t.timestamp()))
        .bind(&update.email)
        .bind(&update.name)
        .bind(&update.avatar_url)
        .bind(update.raw_profile.to_string())
        .bind(Utc::now().timestamp())
        .bind(link_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user's link to a provider
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn delete_provider_link(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM provider_links WHERE user_id = ? AND provider = ?")
            .bind(user_id.to_string())
            .bind(provider)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_provider_link(row: &SqliteRow) -> AppResult<ProviderLink> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let raw_profile: String = row.try_get("raw_profile")?;

        Ok(ProviderLink {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            provider: row.try_get("provider")?,
            provider_user_id: row.try_get("provider_user_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            avatar_url: row.try_get("avatar_url")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            token_expires_at: row
                .try_get::<Option<i64>, _>("token_expires_at")?
                .map(from_timestamp),
            raw_profile: serde_json::from_str(&raw_profile).unwrap_or(serde_json::Value::Null),
            created_at: from_timestamp(row.try_get("created_at")?),
            updated_at: from_timestamp(row.try_get("updated_at")?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::database::tests::create_test_db;
    use crate::errors::ErrorCode;
    use crate::models::{NewProviderLink, ProviderTokenUpdate, User};
    use serde_json::json;
    use uuid::Uuid;

    fn new_link(user_id: Uuid, subject: &str) -> NewProviderLink {
        NewProviderLink {
            user_id,
            provider: "google".into(),
            provider_user_id: subject.into(),
            email: Some("ana@example.com".into()),
            name: Some("Ana".into()),
            avatar_url: None,
            access_token: Some("at-1".into()),
            refresh_token: Some("rt-1".into()),
            token_expires_at: None,
            raw_profile: json!({"sub": subject}),
        }
    }

    #[tokio::test]
    async fn test_link_is_unique_per_provider_identity() {
        let db = create_test_db().await.unwrap();
        let user = User::from_oauth_profile("ana@example.com".into(), None, None, true);
        db.create_user(&user).await.unwrap();

        db.create_provider_link(&new_link(user.id, "sub-1").into_link()).await.unwrap();
        let err = db
            .create_provider_link(&new_link(user.id, "sub-1").into_link())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    }

    #[tokio::test]
    async fn test_token_update_keeps_refresh_token_when_absent() {
        let db = create_test_db().await.unwrap();
        let user = User::from_oauth_profile("ana@example.com".into(), None, None, true);
        db.create_user(&user).await.unwrap();
        let link = new_link(user.id, "sub-2").into_link();
        db.create_provider_link(&link).await.unwrap();

        let updated = db
            .update_provider_link_tokens(
                link.id,
                &ProviderTokenUpdate {
                    access_token: "at-2".into(),
                    refresh_token: None,
                    token_expires_at: None,
                    email: None,
                    name: Some("Ana B".into()),
                    avatar_url: None,
                    raw_profile: json!({"sub": "sub-2", "name": "Ana B"}),
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let stored = db.get_provider_link("google", "sub-2").await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("at-2"));
        assert_eq!(stored.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(stored.name.as_deref(), Some("Ana B"));
        assert_eq!(stored.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_delete_link() {
        let db = create_test_db().await.unwrap();
        let user = User::from_oauth_profile("ana@example.com".into(), None, None, true);
        db.create_user(&user).await.unwrap();
        db.create_provider_link(&new_link(user.id, "sub-3").into_link()).await.unwrap();

        assert!(db.delete_provider_link(user.id, "google").await.unwrap());
        assert!(!db.delete_provider_link(user.id, "google").await.unwrap());
        assert!(db.get_provider_links_for_user(user.id).await.unwrap().is_empty());
    }
}
