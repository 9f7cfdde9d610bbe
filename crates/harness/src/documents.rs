use std::cell::RefCell;

use formforge_engine::{Attachment, DocumentService, EngineError};

/// One call to `generate_document` as the service received it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub template: Vec<u8>,
    pub data: serde_json::Value,
    pub files: Vec<Attachment>,
}

#[derive(Debug, Clone)]
enum Behavior {
    Respond(Vec<u8>),
    Status(u16),
    Unreachable,
}

/// In-process stand-in for the document service that records every request
/// it accepts.
#[derive(Debug)]
pub struct RecordingDocumentService {
    behavior: Behavior,
    requests: RefCell<Vec<DocumentRequest>>,
}

impl Default for RecordingDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDocumentService {
    pub const DOCUMENT: &'static [u8] = b"generated document";

    pub fn new() -> Self {
        Self::with_behavior(Behavior::Respond(Self::DOCUMENT.to_vec()))
    }

    /// Refuses every connection.
    pub fn unreachable() -> Self {
        Self::with_behavior(Behavior::Unreachable)
    }

    /// Healthy, but answers generation requests with `status`.
    pub fn failing(status: u16) -> Self {
        Self::with_behavior(Behavior::Status(status))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<DocumentRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl DocumentService for RecordingDocumentService {
    fn health_check(&self) -> bool {
        !matches!(self.behavior, Behavior::Unreachable)
    }

    fn generate_document(
        &self,
        template: &[u8],
        data: &serde_json::Value,
        files: &[Attachment],
    ) -> Result<Vec<u8>, EngineError> {
        let response = match &self.behavior {
            Behavior::Unreachable => {
                return Err(EngineError::UpstreamUnavailable("connection refused".into()));
            }
            Behavior::Respond(bytes) => Ok(bytes.clone()),
            Behavior::Status(status) => Err(EngineError::Upstream { status: *status }),
        };

        self.requests.borrow_mut().push(DocumentRequest {
            template: template.to_vec(),
            data: data.clone(),
            files: files.to_vec(),
        });
        response
    }
}
