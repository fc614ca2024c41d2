//! Metadata returned by the project and user directories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, OrganizationId, ProjectId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
    pub organization: OrganizationId,
    /// The user who created the project and may act for it.
    pub owner: UserId,
    pub min_per_user: Amount,
    pub max_per_user: Amount,
    pub expected_funding: Amount,
    pub end_date: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: OrganizationId,
    pub name: String,
    pub owner: UserId,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub enabled: bool,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ProjectInfo {
    /// An active project ending in thirty days, funded 1..=10_000 per user
    /// up to 100_000.
    pub fn dummy(organization: OrganizationId, owner: UserId) -> Self {
        Self {
            id: ProjectId::new(),
            name: "Solar roof".to_string(),
            organization,
            owner,
            min_per_user: 100,
            max_per_user: 10_000,
            expected_funding: 100_000,
            end_date: Utc::now() + chrono::Duration::days(30),
            active: true,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl OrganizationInfo {
    pub fn dummy(owner: UserId) -> Self {
        Self {
            id: OrganizationId::new(),
            name: "Energy coop".to_string(),
            owner,
            approved: true,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl UserInfo {
    pub fn dummy(id: UserId) -> Self {
        Self {
            id,
            email: format!("{}@example.com", id.0.simple()),
            name: "Test User".to_string(),
            enabled: true,
        }
    }
}
