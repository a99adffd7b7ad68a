use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{Notification, NotificationId, NotificationQuery, NotificationService};
use crate::designations::UserId;
use crate::http::ApiResult;
use crate::store::Store;

pub fn router<S>(service: Arc<NotificationService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:id/notifications",
            get(list_notifications::<S>),
        )
        .route("/api/v1/notifications/:id/read", post(mark_read::<S>))
        .with_state(service)
}

async fn list_notifications<S: Store + 'static>(
    State(service): State<Arc<NotificationService<S>>>,
    Path(user): Path<UserId>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    service.for_user(user, query).map(Json)
}

async fn mark_read<S: Store + 'static>(
    State(service): State<Arc<NotificationService<S>>>,
    Path(id): Path<NotificationId>,
) -> ApiResult<Notification> {
    service.mark_read(id).map(Json)
}
