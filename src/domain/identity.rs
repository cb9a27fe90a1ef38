use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles carried in the platform's JWT payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    PlatformAdmin,
    CompanyAdmin,
    Agent,
    User,
}

/// Resolved identity of the requester. Authentication happens upstream;
/// by the time a service method runs, the token has already been verified.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    /// Set for company-scoped roles (company admins and agents).
    pub company_id: Option<Uuid>,
}

impl Caller {
    pub fn company_admin(user_id: Uuid, company_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::CompanyAdmin,
            company_id: Some(company_id),
        }
    }

    pub fn platform_admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::PlatformAdmin,
            company_id: None,
        }
    }
}
