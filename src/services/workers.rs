//! Worker registry
//!
//! Worker accounts, availability and the guarded order assignment. Assigning
//! touches two records with no transaction between them: the order's worker
//! reference is written first, and undone if the worker write then fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::notifications::NotificationService;
use crate::domain::*;
use crate::store::{bounded, OrderStore, StoreError, WorkerStore};

pub struct WorkerRegistry {
    workers: Arc<dyn WorkerStore>,
    orders: Arc<dyn OrderStore>,
    notifications: Arc<NotificationService>,
    timeout: Duration,
}

impl WorkerRegistry {
    pub fn new(
        workers: Arc<dyn WorkerStore>,
        orders: Arc<dyn OrderStore>,
        notifications: Arc<NotificationService>,
        timeout: Duration,
    ) -> Self {
        Self {
            workers,
            orders,
            notifications,
            timeout,
        }
    }

    /// Registers a worker under a business. New workers start active and online.
    pub async fn create_worker(&self, input: CreateWorkerRequest) -> ServiceResult<Worker> {
        let name = input.name.trim();
        if name.chars().count() < 2 || name.chars().count() > 100 {
            return Err(ServiceError::validation("name must be between 2 and 100 characters"));
        }
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(ServiceError::validation("email address is invalid"));
        }

        let now = Utc::now();
        let worker = Worker {
            id: Uuid::new_v4(),
            business_id: input.business_id,
            name: name.to_string(),
            email,
            phone: input.phone,
            job_role: input.job_role,
            account_status: AccountStatus::Active,
            work_status: WorkStatus::Online,
            active_orders: Vec::new(),
            last_seen: Some(now),
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.workers.insert_worker(&worker))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => ServiceError::conflict("email is already registered"),
                other => other.into(),
            })?;

        tracing::info!(worker_id = %worker.id, business_id = %worker.business_id, "Worker created");
        Ok(worker)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Worker> {
        bounded(self.timeout, self.workers.find_worker(id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Worker))
    }

    pub async fn list_by_business(&self, business_id: Uuid) -> ServiceResult<Vec<Worker>> {
        Ok(bounded(self.timeout, self.workers.list_workers_by_business(business_id)).await?)
    }

    /// Active, online and not holding an order.
    pub async fn list_available_by_business(&self, business_id: Uuid) -> ServiceResult<Vec<Worker>> {
        Ok(bounded(self.timeout, self.workers.list_available_workers(business_id)).await?)
    }

    pub async fn update_details(&self, id: Uuid, patch: WorkerPatch) -> ServiceResult<Worker> {
        if patch.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        if let Some(name) = &patch.name {
            let len = name.trim().chars().count();
            if !(2..=100).contains(&len) {
                return Err(ServiceError::validation("name must be between 2 and 100 characters"));
            }
        }

        bounded(self.timeout, self.workers.update_worker_details(id, &patch, Utc::now())).await?;
        self.get_by_id(id).await
    }

    pub async fn set_account_status(&self, id: Uuid, status: &str) -> ServiceResult<Worker> {
        let status: AccountStatus = status.parse().map_err(ServiceError::Validation)?;
        bounded(self.timeout, self.workers.set_worker_account_status(id, status, Utc::now())).await?;
        tracing::info!(worker_id = %id, account_status = %status, "Worker account status updated");
        self.get_by_id(id).await
    }

    /// Rejects unknown values before touching the store. Stamps `last_seen`.
    pub async fn set_work_status(&self, id: Uuid, status: &str) -> ServiceResult<Worker> {
        let status: WorkStatus = status.parse().map_err(ServiceError::Validation)?;
        bounded(self.timeout, self.workers.set_worker_work_status(id, status, Utc::now())).await?;
        tracing::info!(worker_id = %id, work_status = %status, "Worker work status updated");
        self.get_by_id(id).await
    }

    /// Guarded assignment of a worker to an order.
    ///
    /// The worker must be online with no active order, and the order must not
    /// already have a worker. If marking the worker busy fails, the order's
    /// previous worker reference is restored before the error is returned.
    pub async fn assign_to_order(&self, worker_id: Uuid, order_id: Uuid) -> ServiceResult<Order> {
        let worker = self.get_by_id(worker_id).await?;
        if worker.work_status != WorkStatus::Online {
            return Err(ServiceError::conflict("worker is not available for assignment"));
        }
        if !worker.active_orders.is_empty() {
            return Err(ServiceError::conflict("worker is already busy with another order"));
        }

        let mut order = bounded(self.timeout, self.orders.find_order(order_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Order))?;
        if order.worker_id.is_some() {
            return Err(ServiceError::conflict("order already has a worker assigned"));
        }
        let previous = order.worker_id;

        let now = Utc::now();
        bounded(self.timeout, self.orders.set_order_worker(order_id, Some(worker_id), now)).await?;

        if let Err(err) = bounded(self.timeout, self.workers.attach_order(worker_id, order_id, now)).await {
            tracing::warn!(
                order_id = %order_id,
                worker_id = %worker_id,
                error = %err,
                "Worker update failed, restoring order assignment"
            );
            if let Err(rollback_err) = bounded(
                self.timeout,
                self.orders.set_order_worker(order_id, previous, Utc::now()),
            )
            .await
            {
                tracing::error!(
                    order_id = %order_id,
                    error = %rollback_err,
                    "Failed to restore order assignment"
                );
            }
            return Err(err.into());
        }

        order.worker_id = Some(worker_id);
        order.updated_at = now;

        tracing::info!(order_id = %order_id, worker_id = %worker_id, "Worker assigned to order");
        self.notifications.worker_assigned(&order, &worker).await;

        Ok(order)
    }

    /// Clears the order's worker, then frees the worker.
    ///
    /// Not compensated: if freeing the worker fails the order stays
    /// unassigned while the worker is still marked busy.
    pub async fn remove_from_order(&self, worker_id: Uuid, order_id: Uuid) -> ServiceResult<Order> {
        self.get_by_id(worker_id).await?;
        let mut order = bounded(self.timeout, self.orders.find_order(order_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Order))?;
        if order.worker_id != Some(worker_id) {
            return Err(ServiceError::conflict("worker is not assigned to this order"));
        }

        let now = Utc::now();
        bounded(self.timeout, self.orders.set_order_worker(order_id, None, now)).await?;
        bounded(self.timeout, self.workers.detach_order(worker_id, order_id, now)).await?;

        order.worker_id = None;
        order.updated_at = now;

        tracing::info!(order_id = %order_id, worker_id = %worker_id, "Worker removed from order");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Harness;
    use crate::store::memory::FailPoint;

    #[tokio::test]
    async fn work_status_is_validated_before_persisting() {
        let h = Harness::new();
        let worker = h.online_worker(Uuid::new_v4()).await;

        let err = h.services.workers.set_work_status(worker.id, "napping").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(h.services.workers.get_by_id(worker.id).await.unwrap().work_status, WorkStatus::Online);

        let updated = h.services.workers.set_work_status(worker.id, "on_break").await.unwrap();
        assert_eq!(updated.work_status, WorkStatus::OnBreak);
        assert!(updated.last_seen >= worker.last_seen);

        let err = h.services.workers.set_work_status(Uuid::new_v4(), "online").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Worker)));
    }

    #[tokio::test]
    async fn availability_listing() {
        let h = Harness::new();
        let business = Uuid::new_v4();
        let ready = h.online_worker(business).await;
        let resting = h.online_worker(business).await;
        let suspended = h.online_worker(business).await;
        h.online_worker(Uuid::new_v4()).await;

        h.services.workers.set_work_status(resting.id, "offline").await.unwrap();
        h.services.workers.set_account_status(suspended.id, "suspended").await.unwrap();

        let available = h.services.workers.list_available_by_business(business).await.unwrap();
        assert_eq!(available.iter().map(|w| w.id).collect::<Vec<_>>(), [ready.id]);
        assert_eq!(h.services.workers.list_by_business(business).await.unwrap().len(), 3);

        let err = h.services.workers.set_account_status(ready.id, "banned").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn assignment_marks_both_sides() {
        let h = Harness::new();
        let order = h.order().await;
        let worker = h.online_worker(order.carwash_id).await;

        let assigned = h.services.workers.assign_to_order(worker.id, order.id).await.unwrap();
        assert_eq!(assigned.worker_id, Some(worker.id));

        let worker = h.services.workers.get_by_id(worker.id).await.unwrap();
        assert_eq!(worker.work_status, WorkStatus::Busy);
        assert_eq!(worker.active_orders, vec![order.id]);
        assert_eq!(h.services.orders.get_by_id(order.id).await.unwrap().worker_id, Some(worker.id));
    }

    #[tokio::test]
    async fn busy_worker_cannot_take_second_order() {
        let h = Harness::new();
        let first = h.order().await;
        let second = h.order().await;
        let worker = h.online_worker(first.carwash_id).await;

        h.services.workers.assign_to_order(worker.id, first.id).await.unwrap();
        let err = h.services.workers.assign_to_order(worker.id, second.id).await.unwrap_err();
        // Busy status is checked before the active-order set
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "worker is not available for assignment"));

        h.services.workers.set_work_status(worker.id, "online").await.unwrap();
        let err = h.services.workers.assign_to_order(worker.id, second.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "worker is already busy with another order"));

        assert_eq!(h.services.orders.get_by_id(second.id).await.unwrap().worker_id, None);
        assert_eq!(h.services.orders.get_by_id(first.id).await.unwrap().worker_id, Some(worker.id));
    }

    #[tokio::test]
    async fn order_with_worker_is_not_reassigned() {
        let h = Harness::new();
        let order = h.order().await;
        let first = h.online_worker(order.carwash_id).await;
        let second = h.online_worker(order.carwash_id).await;

        h.services.workers.assign_to_order(first.id, order.id).await.unwrap();
        let err = h.services.workers.assign_to_order(second.id, order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(h.services.workers.get_by_id(second.id).await.unwrap().active_orders.is_empty());
    }

    #[tokio::test]
    async fn missing_records() {
        let h = Harness::new();
        let worker = h.online_worker(Uuid::new_v4()).await;

        let err = h.services.workers.assign_to_order(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Worker)));

        let err = h.services.workers.assign_to_order(worker.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Order)));
    }

    #[tokio::test]
    async fn failed_worker_write_restores_order() {
        let h = Harness::new();
        let order = h.order().await;
        let worker = h.online_worker(order.carwash_id).await;

        h.store.fail_next(FailPoint::WorkerAssignment);
        let err = h.services.workers.assign_to_order(worker.id, order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Dependency(_)));

        assert_eq!(h.services.orders.get_by_id(order.id).await.unwrap().worker_id, None);
        let worker = h.services.workers.get_by_id(worker.id).await.unwrap();
        assert_eq!(worker.work_status, WorkStatus::Online);
        assert!(worker.active_orders.is_empty());

        // Retry succeeds once the store recovers
        h.services.workers.assign_to_order(worker.id, order.id).await.unwrap();
    }

    #[tokio::test]
    async fn failed_order_write_needs_no_rollback() {
        let h = Harness::new();
        let order = h.order().await;
        let worker = h.online_worker(order.carwash_id).await;

        h.store.fail_next(FailPoint::OrderWorker);
        let err = h.services.workers.assign_to_order(worker.id, order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Dependency(_)));
        assert!(h.services.workers.get_by_id(worker.id).await.unwrap().active_orders.is_empty());
    }

    #[tokio::test]
    async fn removal_frees_worker() {
        let h = Harness::new();
        let order = h.order().await;
        let worker = h.online_worker(order.carwash_id).await;
        h.services.workers.assign_to_order(worker.id, order.id).await.unwrap();

        let stranger = h.online_worker(order.carwash_id).await;
        let err = h.services.workers.remove_from_order(stranger.id, order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let order = h.services.workers.remove_from_order(worker.id, order.id).await.unwrap();
        assert_eq!(order.worker_id, None);
        let worker = h.services.workers.get_by_id(worker.id).await.unwrap();
        assert_eq!(worker.work_status, WorkStatus::Online);
        assert!(worker.is_available());
    }

    #[tokio::test]
    async fn failed_release_is_not_compensated() {
        let h = Harness::new();
        let order = h.order().await;
        let worker = h.online_worker(order.carwash_id).await;
        h.services.workers.assign_to_order(worker.id, order.id).await.unwrap();

        h.store.fail_next(FailPoint::WorkerRelease);
        assert!(h.services.workers.remove_from_order(worker.id, order.id).await.is_err());

        assert_eq!(h.services.orders.get_by_id(order.id).await.unwrap().worker_id, None);
        assert_eq!(h.services.workers.get_by_id(worker.id).await.unwrap().work_status, WorkStatus::Busy);
    }

    #[tokio::test]
    async fn create_and_edit_worker() {
        let h = Harness::new();
        let business = Uuid::new_v4();
        let request = CreateWorkerRequest {
            business_id: business,
            name: "Tunde".into(),
            email: "Tunde@Example.com".into(),
            phone: None,
            job_role: Some("washer".into()),
        };
        let worker = h.services.workers.create_worker(request.clone()).await.unwrap();
        assert_eq!(worker.email, "tunde@example.com");
        assert!(worker.is_available());

        let err = h.services.workers.create_worker(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let patch = WorkerPatch {
            phone: Some("+2348000000000".into()),
            ..Default::default()
        };
        let updated = h.services.workers.update_details(worker.id, patch).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+2348000000000"));
        assert_eq!(updated.name, "Tunde");

        let err = h.services.workers.update_details(worker.id, WorkerPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
