use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Whether a worker is currently able to take orders
    pub enum WorkStatus {
        Online => "online",
        Offline => "offline",
        Busy => "busy",
        OnBreak => "on_break",
    }
}

text_enum! {
    /// Account standing of a worker's user record
    pub enum AccountStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

/// Worker: a user employed by a carwash business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    /// Carwash the worker belongs to.
    pub business_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_role: Option<String>,
    pub account_status: AccountStatus,
    pub work_status: WorkStatus,
    pub active_orders: Vec<Uuid>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    pub fn is_available(&self) -> bool {
        self.account_status == AccountStatus::Active
            && self.work_status == WorkStatus::Online
            && self.active_orders.is_empty()
    }
}

/// Request DTO for registering a worker under a business
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkerRequest {
    pub business_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
}

/// Allow-listed worker profile edits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
}

impl WorkerPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.job_role.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkStatusRequest {
    pub work_status: String,
}
