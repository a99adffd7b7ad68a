use serde::Deserialize;
use tracing::info;

use super::{
    DocumentAction, DocumentLog, DocumentLogInput, DocumentRequestId, DocumentRequestInput,
    DocumentRequestView, DocumentType, DocumentTypeInput,
};
use crate::academics::CampusId;
use crate::designations::UserId;
use crate::notifications::{Notifiable, NotifiableKind, NotificationDraft, DOCUMENT_READY};
use crate::service::{ensure_named, RuleViolation, ServiceContext, ServiceResult};
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DocumentRequestFilter {
    pub user_id: Option<UserId>,
    pub campus_id: Option<CampusId>,
}

pub struct DocumentService<S> {
    ctx: ServiceContext<S>,
}

impl<S> DocumentService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    pub fn create_type(&self, input: DocumentTypeInput) -> ServiceResult<DocumentType> {
        ensure_named("name", &input.name)?;
        self.ctx.write(|db| {
            db.document_types
                .ensure_unique("document type name", |row| {
                    row.name.eq_ignore_ascii_case(&input.name)
                })?;
            Ok(db.document_types.insert_with(|id| DocumentType {
                id,
                name: input.name,
                price_cents: input.price_cents,
            }))
        })
    }

    pub fn types(&self) -> ServiceResult<Vec<DocumentType>> {
        self.ctx
            .read(|db| Ok(db.document_types.iter().cloned().collect()))
    }

    /// Files a request; free documents skip straight to `paid`.
    pub fn submit(&self, input: DocumentRequestInput) -> ServiceResult<DocumentRequestView> {
        ensure_named("purpose", &input.purpose)?;
        let now = self.ctx.clock.now();
        let view = self.ctx.write(|db| {
            db.users.require(input.user_id)?;
            db.campuses.require(input.campus_id)?;
            let price_cents = db.document_types.require(input.document_type_id)?.price_cents;
            let request = db.insert_document_request(input, price_cents, now);
            Ok(db.document_request_view(&request))
        })?;

        info!(
            request = %view.request.id,
            user = %view.request.user_id,
            status = view.latest_status.as_str(),
            "document request submitted"
        );
        Ok(view)
    }

    pub fn request(&self, id: DocumentRequestId) -> ServiceResult<DocumentRequestView> {
        self.ctx.read(|db| {
            let request = db.document_requests.require(id)?;
            Ok(db.document_request_view(request))
        })
    }

    pub fn requests(&self, filter: DocumentRequestFilter) -> ServiceResult<Vec<DocumentRequestView>> {
        self.ctx.read(|db| {
            Ok(db
                .document_requests
                .filter(|row| {
                    filter.user_id.map_or(true, |user| row.user_id == user)
                        && filter.campus_id.map_or(true, |campus| row.campus_id == campus)
                })
                .map(|row| db.document_request_view(row))
                .collect())
        })
    }

    pub fn logs(&self, id: DocumentRequestId) -> ServiceResult<Vec<DocumentLog>> {
        self.ctx.read(|db| {
            db.document_requests.require(id)?;
            Ok(db
                .document_logs
                .filter(|log| log.document_request_id == id)
                .cloned()
                .collect())
        })
    }

    /// Moves the request one step; reaching `pickup` tells the requester it is ready.
    pub fn record(&self, id: DocumentRequestId, input: DocumentLogInput) -> ServiceResult<DocumentRequestView> {
        let now = self.ctx.clock.now();
        let (view, document) = self.ctx.write(|db| {
            let request = db.document_requests.require(id)?.clone();
            db.users.require(input.user_id)?;
            db.document_logs
                .ensure_unique("document request action already recorded", |log| {
                    log.document_request_id == id && log.action == input.action
                })?;

            let from = db.latest_document_status(id);
            if !from.can_move_to(input.action) {
                return Err(RuleViolation::InvalidDocumentTransition {
                    from: from.as_str(),
                    to: input.action.as_str(),
                }
                .into());
            }

            db.document_logs.insert_with(|log_id| DocumentLog {
                id: log_id,
                document_request_id: id,
                user_id: input.user_id,
                action: input.action,
                note: input.note,
                created_at: now,
            });
            let view = db.document_request_view(&request);
            let document = view.document_type.clone();
            Ok((view, document))
        })?;

        info!(
            request = %id,
            action = input.action.as_str(),
            by = %input.user_id,
            "document request updated"
        );

        if input.action == DocumentAction::Pickup {
            self.ctx.notify(NotificationDraft {
                user_id: view.request.user_id,
                notifiable: Notifiable {
                    kind: NotifiableKind::DocumentRequest,
                    id: id.0,
                },
                kind: DOCUMENT_READY,
                title: "Document ready for pickup".to_string(),
                message: format!("Your {document} is ready for pickup at the registrar."),
            })?;
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::academics::Campus;
    use crate::clock::FixedClock;
    use crate::config::PolicyConfig;
    use crate::designations::User;
    use crate::notifications::{NotificationPublisher, StoreNotificationPublisher};
    use crate::service::ServiceError;
    use crate::store::{InMemoryStore, StoreError};

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: DocumentService<InMemoryStore>,
        student: UserId,
        staff: UserId,
        campus: CampusId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::on(
            NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        ));
        let (student, staff, campus) = store
            .write(|db| {
                let student = db.users.insert_with(|id| User {
                    id,
                    name: "Lea Santos".to_string(),
                    email: "lea@example.edu".to_string(),
                    is_admin: false,
                });
                let staff = db.users.insert_with(|id| User {
                    id,
                    name: "Registrar Staff".to_string(),
                    email: "registrar@example.edu".to_string(),
                    is_admin: false,
                });
                let campus = db.campuses.insert_with(|id| Campus {
                    id,
                    name: "Main Campus".to_string(),
                    short_name: "MAIN".to_string(),
                    address: None,
                });
                Ok::<_, StoreError>((student.id, staff.id, campus.id))
            })
            .expect("seed");
        let notifier: Arc<dyn NotificationPublisher> = Arc::new(StoreNotificationPublisher::new(
            Arc::clone(&store),
            clock.clone(),
        ));
        let ctx = ServiceContext::new(Arc::clone(&store), clock, notifier, PolicyConfig::default());
        Fixture {
            store,
            service: DocumentService::new(ctx),
            student,
            staff,
            campus,
        }
    }

    fn request(fx: &Fixture, price_cents: u64) -> DocumentRequestView {
        let document_type = fx
            .service
            .create_type(DocumentTypeInput {
                name: format!("Transcript {price_cents}"),
                price_cents,
            })
            .expect("document type");
        fx.service
            .submit(DocumentRequestInput {
                user_id: fx.student,
                campus_id: fx.campus,
                document_type_id: document_type.id,
                purpose: "Employment".to_string(),
            })
            .expect("submit")
    }

    fn step(fx: &Fixture, id: DocumentRequestId, action: DocumentAction) -> ServiceResult<DocumentRequestView> {
        fx.service.record(
            id,
            DocumentLogInput {
                action,
                user_id: fx.staff,
                note: None,
            },
        )
    }

    #[test]
    fn pickup_notifies_the_requester() {
        let fx = fixture();
        let view = request(&fx, 0);
        assert_eq!(view.latest_status, DocumentAction::Paid);

        step(&fx, view.request.id, DocumentAction::Processing).expect("processing");
        let ready = step(&fx, view.request.id, DocumentAction::Pickup).expect("pickup");
        assert_eq!(ready.latest_status, DocumentAction::Pickup);

        let notifications = fx
            .store
            .read(|db| Ok::<_, StoreError>(db.notifications.iter().cloned().collect::<Vec<_>>()))
            .expect("read");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, fx.student);
        assert_eq!(notifications[0].kind, DOCUMENT_READY);
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let fx = fixture();
        let view = request(&fx, 15_000);
        assert_eq!(view.latest_status, DocumentAction::Submitted);

        let err = step(&fx, view.request.id, DocumentAction::Pickup).expect_err("pickup too early");
        assert!(matches!(
            err,
            ServiceError::Rule(RuleViolation::InvalidDocumentTransition {
                from: "submitted",
                to: "pickup"
            })
        ));
    }

    #[test]
    fn cancelled_requests_stay_cancelled() {
        let fx = fixture();
        let view = request(&fx, 15_000);
        step(&fx, view.request.id, DocumentAction::Cancelled).expect("cancel");

        let err = step(&fx, view.request.id, DocumentAction::Paid).expect_err("terminal");
        assert!(matches!(
            err,
            ServiceError::Rule(RuleViolation::InvalidDocumentTransition { .. })
        ));
    }

    #[test]
    fn repeating_an_action_conflicts() {
        let fx = fixture();
        let view = request(&fx, 0);

        let err = step(&fx, view.request.id, DocumentAction::Paid).expect_err("duplicate");
        assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));
    }
}
