use serde::Serialize;
use uuid::Uuid;

use super::Claims;

/// Account role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CarOwner,
    Business,
    Worker,
    Admin,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "car_owner" | "user" => Some(Self::CarOwner),
            "business" => Some(Self::Business),
            "worker" => Some(Self::Worker),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller, built from verified claims
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,

    /// Carwash the caller manages (business) or works for (worker)
    pub carwash_id: Option<Uuid>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        let role = Role::parse(&claims.role).ok_or("Unknown role in token")?;
        let carwash_id = claims
            .carwash_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| "Invalid carwash ID in token")?;

        Ok(Self {
            user_id,
            role,
            carwash_id,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins act on behalf of anyone.
    pub fn is_user(&self, user_id: Uuid) -> bool {
        self.is_admin() || self.user_id == user_id
    }

    /// True for the owning business account and for admins.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.is_admin() || (self.role == Role::Business && self.user_id == owner_id)
    }

    /// Staff of a carwash: its owner or one of its workers.
    pub fn is_staff_of(&self, carwash_id: Uuid, owner_id: Uuid) -> bool {
        self.can_manage(owner_id) || (self.role == Role::Worker && self.carwash_id == Some(carwash_id))
    }
}
