// ABOUTME: SQLite implementation of ProviderLinkRepository
// ABOUTME: Delegates provider identity links to Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::ProviderLinkRepository;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ProviderLink, ProviderTokenUpdate};
use async_trait::async_trait;
use uuid::Uuid;

/// SQLite implementation of `ProviderLinkRepository`
pub struct ProviderLinkRepositoryImpl {
    db: Database,
}

impl ProviderLinkRepositoryImpl {
    /// Create a new `ProviderLinkRepository` with the given database connection
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProviderLinkRepository for ProviderLinkRepositoryImpl {
    async fn find_by_provider_user(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<Option<ProviderLink>> {
        self.db.get_provider_link(provider, provider_user_id).await
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Vec<ProviderLink>> {
        self.db.get_provider_links_for_user(user_id).await
    }

    async fn create(&self, link: &ProviderLink) -> AppResult<()> {
        self.db.create_provider_link(link).await
    }

    async fn update_tokens(&self, link_id: Uuid, update: &ProviderTokenUpdate) -> AppResult<()> {
        if self.db.update_provider_link_tokens(link_id, update).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Provider link {link_id}")))
        }
    }

    async fn delete(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        self.db.delete_provider_link(user_id, provider).await
    }
}
