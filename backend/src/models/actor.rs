//! The explicit identity every tracked mutation is attributed to.

use serde::{Deserialize, Serialize};

use crate::models::user::{User, UserRole};
use crate::types::UserId;

/// Connection details captured alongside the actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Who performed a mutation. Passed by value into every service call; the core
/// never reads the actor from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    pub meta: RequestMeta,
}

impl Actor {
    pub fn from_user(user: &User, meta: RequestMeta) -> Self {
        Self {
            id: user.id,
            name: user.full_name.clone(),
            role: user.role,
            meta,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}
