use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::ROLE_ADMIN;

/// Caller identity resolved from the Bearer token.
///
/// `sub` is the owner identifier stamped onto every record the caller
/// creates; ownership checks compare against it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if user may run maintenance mutations (provider-file sweep)
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}
