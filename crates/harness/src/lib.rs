mod app;
mod documents;

pub use app::{TestApp, TestEngine, png};
pub use documents::{DocumentRequest, RecordingDocumentService};
