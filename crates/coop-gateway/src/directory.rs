//! Ports to the project and user directory services.

use coop_types::{
    OrganizationId, OrganizationInfo, ProjectId, ProjectInfo, Result, UserId, UserInfo,
};

/// Project and organization metadata lookup.
pub trait ProjectDirectory: Send + Sync {
    /// # Errors
    /// `PRJ_MISSING` if the directory does not know the project.
    fn project(&self, id: ProjectId) -> Result<ProjectInfo>;

    /// Unknown ids are skipped.
    fn projects(&self, ids: &[ProjectId]) -> Result<Vec<ProjectInfo>>;

    /// # Errors
    /// `ORG_MISSING` if the directory does not know the organization.
    fn organization(&self, id: OrganizationId) -> Result<OrganizationInfo>;

    /// Unknown ids are skipped.
    fn organizations(&self, ids: &[OrganizationId]) -> Result<Vec<OrganizationInfo>>;
}

/// User metadata lookup.
pub trait UserDirectory: Send + Sync {
    /// Unknown ids are skipped.
    fn users(&self, ids: &[UserId]) -> Result<Vec<UserInfo>>;
}
