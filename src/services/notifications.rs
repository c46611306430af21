//! Notification service
//!
//! Persists in-app notifications and hands email copies to a bounded queue
//! drained by [`EmailDispatcher`]. Ledgers call the trigger helpers after
//! their own write succeeded; a failure here is logged and never fails the
//! originating operation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use url::Url;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::domain::{Booking, Notification, NotificationKind, Order, UnreadCount, Worker};
use crate::store::{bounded, NotificationStore};

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 100;

/// Email copy of a persisted notification
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub body: String,
}

/// Producer side of the email queue.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailJob>,
}

impl EmailQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EmailJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Never waits. A full or closed queue drops the job.
    pub fn submit(&self, job: EmailJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                tracing::warn!(
                    notification_id = %job.notification_id,
                    "Email queue full, dropping email"
                );
            }
            Err(TrySendError::Closed(job)) => {
                tracing::warn!(
                    notification_id = %job.notification_id,
                    "Email dispatcher stopped, dropping email"
                );
            }
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers email through a JSON HTTP API.
pub struct HttpEmailSender {
    client: Client,
    endpoint: Url,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(endpoint: Url, api_key: &str, from: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create email HTTP client")?;

        tracing::info!(endpoint = %endpoint, "Email sender initialized");

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = OutgoingEmail {
            from: &self.from,
            to,
            subject,
            text: body,
        };

        self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Used when no email API is configured.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, subject = %subject, "Email delivery not configured, logging only");
        Ok(())
    }
}

/// Background task draining the email queue.
pub struct EmailDispatcher {
    store: Arc<dyn NotificationStore>,
    sender: Arc<dyn EmailSender>,
    jobs: mpsc::Receiver<EmailJob>,
    timeout: Duration,
}

impl EmailDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        sender: Arc<dyn EmailSender>,
        jobs: mpsc::Receiver<EmailJob>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            sender,
            jobs,
            timeout,
        }
    }

    /// Runs until every [`EmailQueue`] handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Email dispatcher started");
        while let Some(job) = self.jobs.recv().await {
            self.deliver(job).await;
        }
        tracing::info!("Email dispatcher stopped");
    }

    async fn deliver(&self, job: EmailJob) {
        let recipient = match bounded(self.timeout, self.store.recipient_email(job.user_id)).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                tracing::warn!(user_id = %job.user_id, "No email address on file, skipping email");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id = %job.user_id, error = %e, "Failed to look up email recipient");
                return;
            }
        };

        if let Err(e) = self.sender.send(&recipient, &job.subject, &job.body).await {
            tracing::warn!(
                notification_id = %job.notification_id,
                error = %e,
                "Failed to send notification email"
            );
            return;
        }

        if let Err(e) = bounded(self.timeout, self.store.mark_email_sent(job.notification_id)).await {
            tracing::warn!(
                notification_id = %job.notification_id,
                error = %e,
                "Email sent but flag update failed"
            );
        }
    }
}

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    emails: EmailQueue,
    timeout: Duration,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, emails: EmailQueue, timeout: Duration) -> Self {
        Self {
            store,
            emails,
            timeout,
        }
    }

    /// Create a notification for a user, optionally queueing an email copy.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        send_email: bool,
    ) -> ServiceResult<Notification> {
        if title.trim().is_empty() || message.trim().is_empty() {
            return Err(ServiceError::validation("notification title and message are required"));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            kind,
            is_read: false,
            email_sent: false,
            created_at: Utc::now(),
        };

        bounded(self.timeout, self.store.insert_notification(&notification)).await?;

        tracing::info!(
            user_id = %user_id,
            notification_type = %kind,
            notification_id = %notification.id,
            "Notification created"
        );

        if send_email {
            self.emails.submit(EmailJob {
                notification_id: notification.id,
                user_id,
                subject: notification.title.clone(),
                body: notification.message.clone(),
            });
        }

        Ok(notification)
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: Option<u32>) -> ServiceResult<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        Ok(bounded(self.timeout, self.store.list_notifications(user_id, limit)).await?)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        Ok(bounded(self.timeout, self.store.mark_notification_read(id, user_id)).await?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> ServiceResult<u64> {
        Ok(bounded(self.timeout, self.store.mark_all_notifications_read(user_id)).await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> ServiceResult<UnreadCount> {
        let unread = bounded(self.timeout, self.store.count_unread(user_id)).await?;
        Ok(UnreadCount { unread })
    }

    pub async fn booking_confirmed(&self, booking: &Booking) {
        let message = format!(
            "Your booking for {} is confirmed. You are number {} in the queue.",
            booking.booking_time.format("%Y-%m-%d %H:%M UTC"),
            booking.queue_number
        );
        self.fire(booking.user_id, NotificationKind::Booking, "Booking confirmed", &message)
            .await;
    }

    pub async fn order_created(&self, order: &Order) {
        let message = format!("Order #{} has been created from your booking.", order.queue_number);
        self.fire(order.user_id, NotificationKind::Order, "Order created", &message)
            .await;
    }

    pub async fn worker_assigned(&self, order: &Order, worker: &Worker) {
        self.fire(
            worker.id,
            NotificationKind::Worker,
            "New order assigned",
            &format!("You have been assigned order #{}.", order.queue_number),
        )
        .await;
        self.fire(
            order.user_id,
            NotificationKind::Order,
            "Washer assigned",
            &format!("{} will be handling your order.", worker.name),
        )
        .await;
    }

    pub async fn order_status_changed(&self, order: &Order) {
        let message = format!("Your order is now {}.", order.status.as_str().replace('_', " "));
        self.fire(order.user_id, NotificationKind::Order, "Order status update", &message)
            .await;
    }

    async fn fire(&self, user_id: Uuid, kind: NotificationKind, title: &str, message: &str) {
        if let Err(e) = self.notify(user_id, kind, title, message, true).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to create notification");
        }
    }
}
