use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub carwash_id: Uuid,
    pub order_id: Option<Uuid>,
    pub rating: i32,
    pub accuracy: i32,
    pub cleanliness: i32,
    pub worker_rating: Option<i32>,
    pub comment: Option<String>,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a review
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub carwash_id: Uuid,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    pub rating: i32,
    pub accuracy: i32,
    pub cleanliness: i32,
    #[serde(default)]
    pub worker_rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Aggregate rating for a carwash
#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub carwash_id: Uuid,
    pub average_rating: f64,
}
