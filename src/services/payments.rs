use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::domain::*;
use crate::store::{bounded, OrderStore, PaymentStore};

/// Append-only record of settled payments. No gateway integration.
pub struct PaymentLedger {
    payments: Arc<dyn PaymentStore>,
    orders: Arc<dyn OrderStore>,
    timeout: Duration,
}

impl PaymentLedger {
    pub fn new(payments: Arc<dyn PaymentStore>, orders: Arc<dyn OrderStore>, timeout: Duration) -> Self {
        Self {
            payments,
            orders,
            timeout,
        }
    }

    /// Records a payment. A `paid` record also marks the order as paid.
    pub async fn create_payment(&self, user_id: Uuid, input: CreatePaymentRequest) -> ServiceResult<Payment> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::validation("amount must be greater than zero"));
        }

        let order = bounded(self.timeout, self.orders.find_order(input.order_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Order))?;
        if order.carwash_id != input.carwash_id {
            return Err(ServiceError::validation("order does not belong to this carwash"));
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            user_id,
            carwash_id: input.carwash_id,
            order_id: input.order_id,
            amount: input.amount,
            method: input.method,
            status: input.status.unwrap_or(PaymentRecordStatus::Paid),
            transaction_ref: input.transaction_ref,
            paid_at: input.paid_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.payments.insert_payment(&payment)).await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            status = %payment.status,
            "Payment recorded"
        );

        if payment.status == PaymentRecordStatus::Paid {
            if let Err(e) = bounded(
                self.timeout,
                self.orders.set_order_payment_status(order.id, PaymentStatus::Paid, now),
            )
            .await
            {
                tracing::warn!(order_id = %order.id, error = %e, "Payment recorded but order not marked paid");
            }
        }

        Ok(payment)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ServiceResult<Vec<Payment>> {
        Ok(bounded(self.timeout, self.payments.list_payments_by_user(user_id)).await?)
    }

    pub async fn list_by_carwash(&self, carwash_id: Uuid) -> ServiceResult<Vec<Payment>> {
        Ok(bounded(self.timeout, self.payments.list_payments_by_carwash(carwash_id)).await?)
    }

    pub async fn get_by_order(&self, order_id: Uuid) -> ServiceResult<Payment> {
        bounded(self.timeout, self.payments.find_payment_by_order(order_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Payment))
    }

    pub async fn earnings_by_carwash(&self, carwash_id: Uuid) -> ServiceResult<EarningsSummary> {
        let total_paid = bounded(self.timeout, self.payments.total_paid_for_carwash(carwash_id)).await?;
        Ok(EarningsSummary {
            carwash_id,
            total_paid,
        })
    }
}
