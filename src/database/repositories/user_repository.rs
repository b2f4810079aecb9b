// ABOUTME: SQLite implementation of UserRepository
// ABOUTME: Delegates user lookups, creation and login bookkeeping to Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::UserRepository;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// SQLite implementation of `UserRepository`
pub struct UserRepositoryImpl {
    db: Database,
}

impl UserRepositoryImpl {
    /// Create a new `UserRepository` with the given database connection
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.db.get_user(id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.db.get_user_by_email(email).await
    }

    async fn create(&self, user: &User) -> AppResult<Uuid> {
        self.db.create_user(user).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        self.db.update_user(user).await
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.db.update_last_login(id, at).await
    }
}
