//! Car registry
//!
//! Vehicles owned by car owners. Every lookup made on behalf of a user is
//! scoped to that user: someone else's car reads as missing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::domain::*;
use crate::store::{bounded, CarStore, StoreError};

const MAX_FIELD_CHARS: usize = 50;

fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ServiceError::Validation(format!(
            "{} cannot exceed {} characters",
            field, MAX_FIELD_CHARS
        )));
    }
    Ok(value.to_string())
}

pub struct CarRegistry {
    cars: Arc<dyn CarStore>,
    timeout: Duration,
}

impl CarRegistry {
    pub fn new(cars: Arc<dyn CarStore>, timeout: Duration) -> Self {
        Self { cars, timeout }
    }

    pub async fn create_car(&self, owner_id: Uuid, input: CreateCarRequest) -> ServiceResult<Car> {
        let model = required_text("model", &input.model)?;
        let plate = required_text("plate", &input.plate)?;

        let now = Utc::now();
        let car = Car {
            id: Uuid::new_v4(),
            owner_id,
            model,
            plate,
            color: input.color.filter(|c| !c.trim().is_empty()),
            is_default: input.is_default,
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.cars.insert_car(&car))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => ServiceError::conflict("another default car was set concurrently"),
                other => other.into(),
            })?;

        tracing::info!(car_id = %car.id, owner_id = %owner_id, is_default = car.is_default, "Car registered");
        Ok(car)
    }

    pub async fn list_by_user(&self, owner_id: Uuid) -> ServiceResult<Vec<Car>> {
        Ok(bounded(self.timeout, self.cars.list_cars_by_owner(owner_id)).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Car> {
        bounded(self.timeout, self.cars.find_car(id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Car))
    }

    /// The car, provided `owner_id` owns it.
    pub async fn get_owned(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<Car> {
        let car = self.get_by_id(id).await?;
        if car.owner_id != owner_id {
            return Err(ServiceError::NotFound(Entity::Car));
        }
        Ok(car)
    }

    pub async fn update_car(&self, owner_id: Uuid, id: Uuid, mut patch: CarPatch) -> ServiceResult<Car> {
        if patch.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        patch.model = patch.model.as_deref().map(|m| required_text("model", m)).transpose()?;
        patch.plate = patch.plate.as_deref().map(|p| required_text("plate", p)).transpose()?;

        self.get_owned(owner_id, id).await?;
        bounded(self.timeout, self.cars.update_car(id, &patch, Utc::now())).await?;
        self.get_by_id(id).await
    }

    pub async fn delete_car(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.get_owned(owner_id, id).await?;
        bounded(self.timeout, self.cars.delete_car(id)).await?;
        tracing::info!(car_id = %id, owner_id = %owner_id, "Car deleted");
        Ok(())
    }

    /// Makes `id` the owner's only default car.
    pub async fn set_default(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<Car> {
        bounded(self.timeout, self.cars.set_default_car(owner_id, id, Utc::now())).await?;
        tracing::info!(car_id = %id, owner_id = %owner_id, "Default car changed");
        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Harness;

    fn car(model: &str, plate: &str, is_default: bool) -> CreateCarRequest {
        CreateCarRequest {
            model: model.to_string(),
            plate: plate.to_string(),
            color: None,
            is_default,
        }
    }

    #[tokio::test]
    async fn registering_a_default_car_takes_over_the_flag() {
        let h = Harness::new();
        let owner = Uuid::new_v4();
        let cars = &h.services.cars;

        let first = cars.create_car(owner, car("Corolla", "LAG-123", true)).await.unwrap();
        let second = cars.create_car(owner, car("Civic", "ABJ-456", true)).await.unwrap();
        let third = cars.create_car(owner, car("Golf", "KAN-789", false)).await.unwrap();

        let listed = cars.list_by_user(owner).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), [first.id, second.id, third.id]);
        assert_eq!(
            listed.iter().filter(|c| c.is_default).map(|c| c.id).collect::<Vec<_>>(),
            [second.id]
        );

        let now_default = cars.set_default(owner, first.id).await.unwrap();
        assert!(now_default.is_default);
        assert!(!cars.get_by_id(second.id).await.unwrap().is_default);
    }

    #[tokio::test]
    async fn model_and_plate_are_required() {
        let h = Harness::new();
        let cars = &h.services.cars;

        let err = cars.create_car(Uuid::new_v4(), car("  ", "LAG-123", false)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "model is required"));

        let err = cars.create_car(Uuid::new_v4(), car("Corolla", "", false)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "plate is required"));

        let long = "x".repeat(51);
        assert!(cars.create_car(Uuid::new_v4(), car(&long, "LAG-123", false)).await.is_err());
    }

    #[tokio::test]
    async fn update_is_allow_listed_and_scoped_to_owner() {
        let h = Harness::new();
        let owner = Uuid::new_v4();
        let cars = &h.services.cars;
        let registered = cars.create_car(owner, car("Corolla", "LAG-123", false)).await.unwrap();

        let patch = CarPatch {
            color: Some("Silver".into()),
            plate: Some(" LAG-999 ".into()),
            ..Default::default()
        };
        let updated = cars.update_car(owner, registered.id, patch.clone()).await.unwrap();
        assert_eq!(updated.color.as_deref(), Some("Silver"));
        assert_eq!(updated.plate, "LAG-999");
        assert_eq!(updated.model, "Corolla");
        assert!(updated.updated_at >= registered.updated_at);

        let err = cars.update_car(Uuid::new_v4(), registered.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));

        let err = cars
            .update_car(owner, registered.id, CarPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let blank = CarPatch {
            model: Some(" ".into()),
            ..Default::default()
        };
        assert!(cars.update_car(owner, registered.id, blank).await.is_err());
    }

    #[tokio::test]
    async fn only_the_owner_can_delete_or_promote() {
        let h = Harness::new();
        let owner = Uuid::new_v4();
        let cars = &h.services.cars;
        let registered = cars.create_car(owner, car("Corolla", "LAG-123", false)).await.unwrap();
        let stranger = Uuid::new_v4();

        let err = cars.set_default(stranger, registered.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));
        let err = cars.delete_car(stranger, registered.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));
        assert!(cars.get_owned(stranger, registered.id).await.is_err());

        cars.delete_car(owner, registered.id).await.unwrap();
        let err = cars.get_by_id(registered.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));
        assert!(cars.list_by_user(owner).await.unwrap().is_empty());
    }
}
