use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::domain::*;
use crate::store::{bounded, CarwashStore, OrderStore, ReviewStore, StoreError};

const ALREADY_REVIEWED: &str = "you have already reviewed this order";
const MAX_COMMENT_CHARS: usize = 500;

fn validate_score(field: &str, score: i32) -> ServiceResult<()> {
    if !(1..=5).contains(&score) {
        return Err(ServiceError::Validation(format!("{} must be between 1 and 5", field)));
    }
    Ok(())
}

pub struct ReviewLedger {
    reviews: Arc<dyn ReviewStore>,
    carwashes: Arc<dyn CarwashStore>,
    orders: Arc<dyn OrderStore>,
    timeout: Duration,
}

impl ReviewLedger {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        carwashes: Arc<dyn CarwashStore>,
        orders: Arc<dyn OrderStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            reviews,
            carwashes,
            orders,
            timeout,
        }
    }

    /// One review per user and order. The store's unique constraint catches
    /// a concurrent duplicate that slips past the existence check.
    pub async fn create_review(&self, user_id: Uuid, input: CreateReviewRequest) -> ServiceResult<Review> {
        validate_score("rating", input.rating)?;
        validate_score("accuracy", input.accuracy)?;
        validate_score("cleanliness", input.cleanliness)?;
        if let Some(worker_rating) = input.worker_rating {
            validate_score("worker_rating", worker_rating)?;
        }
        if let Some(comment) = &input.comment {
            if comment.chars().count() > MAX_COMMENT_CHARS {
                return Err(ServiceError::Validation(format!(
                    "comment cannot exceed {} characters",
                    MAX_COMMENT_CHARS
                )));
            }
        }

        bounded(self.timeout, self.carwashes.find_carwash(input.carwash_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Carwash))?;

        if let Some(order_id) = input.order_id {
            let order = bounded(self.timeout, self.orders.find_order(order_id))
                .await?
                .ok_or(ServiceError::NotFound(Entity::Order))?;
            if order.carwash_id != input.carwash_id {
                return Err(ServiceError::validation("order does not belong to this carwash"));
            }
            if bounded(self.timeout, self.reviews.review_exists(user_id, order_id)).await? {
                return Err(ServiceError::conflict(ALREADY_REVIEWED));
            }
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            carwash_id: input.carwash_id,
            order_id: input.order_id,
            rating: input.rating,
            accuracy: input.accuracy,
            cleanliness: input.cleanliness,
            worker_rating: input.worker_rating,
            comment: input.comment,
            photos: input.photos,
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.reviews.insert_review(&review))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => ServiceError::conflict(ALREADY_REVIEWED),
                other => other.into(),
            })?;

        tracing::info!(review_id = %review.id, carwash_id = %review.carwash_id, rating = review.rating, "Review created");
        Ok(review)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ServiceResult<Vec<Review>> {
        Ok(bounded(self.timeout, self.reviews.list_reviews_by_user(user_id)).await?)
    }

    pub async fn list_by_carwash(&self, carwash_id: Uuid) -> ServiceResult<Vec<Review>> {
        Ok(bounded(self.timeout, self.reviews.list_reviews_by_carwash(carwash_id)).await?)
    }

    pub async fn get_by_order(&self, order_id: Uuid) -> ServiceResult<Review> {
        bounded(self.timeout, self.reviews.find_review_by_order(order_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Review))
    }

    /// Mean rating. A carwash without reviews has no average.
    pub async fn average_rating(&self, carwash_id: Uuid) -> ServiceResult<RatingSummary> {
        let average_rating = bounded(self.timeout, self.reviews.average_rating(carwash_id))
            .await?
            .ok_or_else(|| ServiceError::validation("no reviews for this carwash"))?;

        Ok(RatingSummary {
            carwash_id,
            average_rating,
        })
    }
}
