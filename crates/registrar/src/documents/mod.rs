//! Registrar document requests (transcripts, certifications) and their processing trail.

mod router;
mod service;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::academics::CampusId;
use crate::designations::UserId;
use crate::store::{record, record_id, Database};

pub use router::router;
pub use service::{DocumentRequestFilter, DocumentService};

record_id!(DocumentTypeId);
record_id!(DocumentRequestId);
record_id!(DocumentLogId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: DocumentTypeId,
    pub name: String,
    /// Price in cents; zero marks a free document.
    pub price_cents: u64,
}

record!(DocumentType, DocumentTypeId, "document type");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub id: DocumentRequestId,
    pub user_id: UserId,
    pub campus_id: CampusId,
    pub document_type_id: DocumentTypeId,
    pub purpose: String,
    pub created_at: NaiveDateTime,
}

record!(DocumentRequest, DocumentRequestId, "document request");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAction {
    Submitted,
    Paid,
    Processing,
    Pickup,
    Completed,
    Rejected,
    Cancelled,
}

impl DocumentAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentAction::Submitted => "submitted",
            DocumentAction::Paid => "paid",
            DocumentAction::Processing => "processing",
            DocumentAction::Pickup => "pickup",
            DocumentAction::Completed => "completed",
            DocumentAction::Rejected => "rejected",
            DocumentAction::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            DocumentAction::Completed | DocumentAction::Rejected | DocumentAction::Cancelled
        )
    }

    /// Whether a request whose latest step is `self` may move to `next`.
    pub fn can_move_to(self, next: DocumentAction) -> bool {
        use DocumentAction::*;

        match (self, next) {
            (Submitted, Paid)
            | (Submitted | Paid, Processing)
            | (Processing, Pickup)
            | (Pickup, Completed) => true,
            (from, Rejected | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLog {
    pub id: DocumentLogId,
    pub document_request_id: DocumentRequestId,
    pub user_id: UserId,
    pub action: DocumentAction,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

record!(DocumentLog, DocumentLogId, "document request log");

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentTypeInput {
    pub name: String,
    #[serde(default)]
    pub price_cents: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRequestInput {
    pub user_id: UserId,
    pub campus_id: CampusId,
    pub document_type_id: DocumentTypeId,
    pub purpose: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentLogInput {
    pub action: DocumentAction,
    pub user_id: UserId,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequestView {
    #[serde(flatten)]
    pub request: DocumentRequest,
    pub document_type: String,
    pub price_cents: u64,
    pub latest_status: DocumentAction,
}

impl Database {
    pub(crate) fn latest_document_status(&self, request: DocumentRequestId) -> DocumentAction {
        self.document_logs
            .filter(|log| log.document_request_id == request)
            .last()
            .map_or(DocumentAction::Submitted, |log| log.action)
    }

    pub(crate) fn document_request_view(&self, request: &DocumentRequest) -> DocumentRequestView {
        let document_type = self.document_types.get(request.document_type_id);
        DocumentRequestView {
            request: request.clone(),
            document_type: document_type.map_or_else(String::new, |row| row.name.clone()),
            price_cents: document_type.map_or(0, |row| row.price_cents),
            latest_status: self.latest_document_status(request.id),
        }
    }

    /// Inserts a request with its `submitted` log, plus `paid` when the document is free.
    pub(crate) fn insert_document_request(
        &mut self,
        input: DocumentRequestInput,
        price_cents: u64,
        now: NaiveDateTime,
    ) -> DocumentRequest {
        let request = self.document_requests.insert_with(|id| DocumentRequest {
            id,
            user_id: input.user_id,
            campus_id: input.campus_id,
            document_type_id: input.document_type_id,
            purpose: input.purpose,
            created_at: now,
        });

        let mut steps = vec![(DocumentAction::Submitted, "Document request submitted")];
        if price_cents == 0 {
            steps.push((DocumentAction::Paid, "Payment not required (free document)"));
        }
        for (action, note) in steps {
            self.document_logs.insert_with(|id| DocumentLog {
                id,
                document_request_id: request.id,
                user_id: request.user_id,
                action,
                note: Some(note.to_string()),
                created_at: now,
            });
        }
        request
    }
}
