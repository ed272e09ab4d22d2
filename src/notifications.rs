//! Push-notification permission collaborator.

use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Undetermined,
    Denied,
    Granted,
}

#[async_trait]
pub trait NotificationPermissions: Send + Sync {
    async fn status(&self) -> StoreResult<PermissionStatus>;
    /// Prompts the user; returns the resulting status.
    async fn request(&self) -> StoreResult<PermissionStatus>;
}

/// Asks for permission unless it has already been granted.
pub async fn ensure_notification_permission(
    permissions: &dyn NotificationPermissions,
) -> StoreResult<PermissionStatus> {
    let status = permissions.status().await?;
    if status == PermissionStatus::Granted {
        debug!("notification permission already granted");
        return Ok(status);
    }
    let status = permissions.request().await?;
    info!(?status, "notification permission requested");
    Ok(status)
}

/// Fixed answer to permission prompts.
pub struct StaticPermissions {
    status: Mutex<PermissionStatus>,
    answer: PermissionStatus,
    requests: Mutex<u32>,
}

impl StaticPermissions {
    pub fn new(initial: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(initial),
            answer,
            requests: Mutex::new(0),
        }
    }

    pub fn request_count(&self) -> u32 {
        *self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationPermissions for StaticPermissions {
    async fn status(&self) -> StoreResult<PermissionStatus> {
        Ok(*self.status.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn request(&self) -> StoreResult<PermissionStatus> {
        *self.requests.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        *status = self.answer;
        Ok(*status)
    }
}
