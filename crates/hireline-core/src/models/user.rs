// ABOUTME: Local user account model and user type enumeration
// ABOUTME: Users created by OAuth login have no password and a provider-verified email flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of a portal account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Standard end-user looking for jobs
    #[default]
    JobSeeker,
    /// Company account posting jobs
    Employer,
    /// Portal administrator
    Admin,
}

impl UserType {
    /// Database and claim representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobSeeker => "job_seeker",
            Self::Employer => "employer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_seeker" => Ok(Self::JobSeeker),
            "employer" => Ok(Self::Employer),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

/// Local user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Login email (unique)
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// Password hash; `None` for accounts created through OAuth
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Account role
    pub user_type: UserType,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New passwordless user created from a provider profile
    #[must_use]
    pub fn from_oauth_profile(
        email: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
        email_verified: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            avatar_url,
            password_hash: None,
            user_type: UserType::default(),
            email_verified,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_user_defaults() {
        let user = User::from_oauth_profile("a@example.com".into(), None, None, true);
        assert_eq!(user.user_type, UserType::JobSeeker);
        assert!(user.password_hash.is_none());
        assert!(user.email_verified);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_user_type_round_trips_through_str() {
        for user_type in [UserType::JobSeeker, UserType::Employer, UserType::Admin] {
            assert_eq!(user_type.as_str().parse::<UserType>(), Ok(user_type));
        }
        assert!("recruiter".parse::<UserType>().is_err());
    }
}
