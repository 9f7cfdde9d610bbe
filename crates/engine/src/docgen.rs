//! Client for the external document generation service.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::submission::Attachment;

pub const HEALTH_CHECK_PATH: &str = "api/health-check";
pub const GENERATE_PATH: &str = "api/generate-document";

/// Name the template part is uploaded under.
pub const TEMPLATE_FILENAME: &str = "template.docx";

pub trait DocumentService {
    /// True if the service answered its health check with a success status.
    /// Connection failures report false rather than an error.
    fn health_check(&self) -> bool;

    /// Render `template` with `data`. Each attachment is sent as its own
    /// part, named after its generated filename.
    fn generate_document(
        &self,
        template: &[u8],
        data: &serde_json::Value,
        files: &[Attachment],
    ) -> Result<Vec<u8>, EngineError>;
}

pub struct HttpDocumentService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

/// Ensure the base ends in exactly one slash so endpoint paths append cleanly.
fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

impl HttpDocumentService {
    /// `timeout` bounds each request as a whole, connecting included.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl DocumentService for HttpDocumentService {
    fn health_check(&self) -> bool {
        match self.client.get(self.endpoint(HEALTH_CHECK_PATH)).send() {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "document service health check failed");
                false
            }
        }
    }

    fn generate_document(
        &self,
        template: &[u8],
        data: &serde_json::Value,
        files: &[Attachment],
    ) -> Result<Vec<u8>, EngineError> {
        let mut form = Form::new().text("data", serde_json::to_string(data)?).part(
            "doc_form",
            Part::bytes(template.to_vec()).file_name(TEMPLATE_FILENAME),
        );
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str(&file.mime)?;
            form = form.part(file.filename.clone(), part);
        }

        let response = self
            .client
            .post(self.endpoint(GENERATE_PATH))
            .multipart(form)
            .send()
            .map_err(|e| {
                warn!(error = %e, "document service unreachable");
                EngineError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "document generation failed");
            return Err(EngineError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;
        debug!(len = bytes.len(), attachments = files.len(), "document generated");
        Ok(bytes.to_vec())
    }
}
