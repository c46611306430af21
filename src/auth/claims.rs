use serde::{Deserialize, Serialize};

/// JWT claims issued by the account service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer - optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// One of car_owner, business, worker, admin
    pub role: String,

    /// User email - optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Carwash the account manages or works for - optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carwash_id: Option<String>,
}
