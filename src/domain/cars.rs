use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vehicle registered by a car owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// e.g. "Toyota Camry"
    pub model: String,
    pub plate: String,
    pub color: Option<String>,
    /// Preselected when booking. At most one per owner.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for registering a car
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCarRequest {
    pub model: String,
    pub plate: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Allow-listed car edits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarPatch {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CarPatch {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.plate.is_none() && self.color.is_none()
    }
}
