//! Wires every domain service over one store and merges their routers.

use std::sync::Arc;

use axum::Router;

use crate::academics::{academic_router, section_router, AcademicService, SectionService};
use crate::admissions::{
    admission_router, university_router, AdmissionService, UniversityAdmissionService,
};
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::designations::{self, DesignationService};
use crate::documents::{self, DocumentService};
use crate::enrollment::{self, EnrollmentService};
use crate::gradebook::{self, GradeBookService};
use crate::notifications::{
    self, NotificationPublisher, NotificationService, StoreNotificationPublisher,
};
use crate::service::ServiceContext;
use crate::store::Store;

pub struct Registrar<S> {
    pub academics: Arc<AcademicService<S>>,
    pub sections: Arc<SectionService<S>>,
    pub admissions: Arc<AdmissionService<S>>,
    pub university: Arc<UniversityAdmissionService<S>>,
    pub enrollment: Arc<EnrollmentService<S>>,
    pub gradebooks: Arc<GradeBookService<S>>,
    pub documents: Arc<DocumentService<S>>,
    pub designations: Arc<DesignationService<S>>,
    pub notifications: Arc<NotificationService<S>>,
}

impl<S> Registrar<S>
where
    S: Store + 'static,
{
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationPublisher>,
        policy: PolicyConfig,
    ) -> Self {
        let ctx = ServiceContext::new(store, clock, notifier, policy);
        Self {
            academics: Arc::new(AcademicService::new(ctx.clone())),
            sections: Arc::new(SectionService::new(ctx.clone())),
            admissions: Arc::new(AdmissionService::new(ctx.clone())),
            university: Arc::new(UniversityAdmissionService::new(ctx.clone())),
            enrollment: Arc::new(EnrollmentService::new(ctx.clone())),
            gradebooks: Arc::new(GradeBookService::new(ctx.clone())),
            documents: Arc::new(DocumentService::new(ctx.clone())),
            designations: Arc::new(DesignationService::new(ctx.clone())),
            notifications: Arc::new(NotificationService::new(ctx)),
        }
    }

    /// Notifications land in the same store as everything else.
    pub fn with_store_notifications(store: Arc<S>, clock: Arc<dyn Clock>, policy: PolicyConfig) -> Self {
        let notifier = Arc::new(StoreNotificationPublisher::new(
            Arc::clone(&store),
            Arc::clone(&clock),
        ));
        Self::new(store, clock, notifier, policy)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(academic_router(Arc::clone(&self.academics)))
            .merge(section_router(Arc::clone(&self.sections)))
            .merge(admission_router(Arc::clone(&self.admissions)))
            .merge(university_router(Arc::clone(&self.university)))
            .merge(enrollment::router(Arc::clone(&self.enrollment)))
            .merge(gradebook::router(Arc::clone(&self.gradebooks)))
            .merge(documents::router(Arc::clone(&self.documents)))
            .merge(designations::router(Arc::clone(&self.designations)))
            .merge(notifications::router(Arc::clone(&self.notifications)))
    }
}
