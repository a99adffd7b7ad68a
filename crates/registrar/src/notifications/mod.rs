//! In-app notifications raised by admission, enrollment, and document workflows.

mod router;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::designations::UserId;
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{record, record_id, Store, StoreError};

pub use router::router;

record_id!(NotificationId);

pub const ADMISSION_ACCEPTED: &str = "admission_accepted";
pub const ENROLLMENT_CONFIRMED: &str = "enrollment_confirmed";
pub const DOCUMENT_READY: &str = "document_ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifiableKind {
    AdmissionApplication,
    UniversityApplication,
    Enrollment,
    DocumentRequest,
}

/// The record a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifiable {
    pub kind: NotifiableKind,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub notifiable: Notifiable,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

record!(Notification, NotificationId, "notification");

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: UserId,
    pub notifiable: Notifiable,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Delivers drafts once the write that produced them has committed.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, draft: NotificationDraft) -> Result<(), NotificationError>;
}

/// Persists notifications into the store's `notifications` table.
pub struct StoreNotificationPublisher<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> StoreNotificationPublisher<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl<S: Store> NotificationPublisher for StoreNotificationPublisher<S> {
    fn publish(&self, draft: NotificationDraft) -> Result<(), NotificationError> {
        let created_at = self.clock.now();
        let notification = self.store.write(|db| {
            Ok::<_, NotificationError>(db.notifications.insert_with(|id| Notification {
                id,
                user_id: draft.user_id,
                notifiable: draft.notifiable,
                kind: draft.kind.to_string(),
                title: draft.title,
                message: draft.message,
                is_read: false,
                created_at,
            }))
        })?;

        debug!(
            notification = %notification.id,
            user = %notification.user_id,
            kind = %notification.kind,
            "notification stored"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

pub struct NotificationService<S> {
    ctx: ServiceContext<S>,
}

impl<S> NotificationService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    /// Newest first.
    pub fn for_user(&self, user: UserId, query: NotificationQuery) -> ServiceResult<Vec<Notification>> {
        self.ctx.read(|db| {
            db.users.require(user)?;
            let mut rows: Vec<_> = db
                .notifications
                .filter(|row| row.user_id == user && (!query.unread || !row.is_read))
                .cloned()
                .collect();
            rows.reverse();
            Ok(rows)
        })
    }

    pub fn unread_for(&self, user: UserId) -> ServiceResult<Vec<Notification>> {
        self.for_user(user, NotificationQuery { unread: true })
    }

    pub fn mark_read(&self, id: NotificationId) -> ServiceResult<Notification> {
        self.ctx.write(|db| {
            let row = db.notifications.require_mut(id)?;
            row.is_read = true;
            Ok(row.clone())
        })
    }
}
