pub mod config;
pub mod docgen;
pub mod editor;
pub mod error;
pub mod materialize;
pub mod select_editor;
pub mod session;
pub mod submission;

pub use config::Config;
pub use docgen::{DocumentService, HttpDocumentService};
pub use editor::{ChoiceGroup, ChoiceOption, EditorState, FormEditor, editor_choices};
pub use error::{EngineError, ErrorKind};
pub use materialize::{FieldRegistry, FieldSpec, FieldTemplate, FormInstance, Widget, generate_fields};
pub use select_editor::{MIN_CHOICES, SelectFieldEditor};
pub use session::{MemorySessionStore, SessionData, SessionStore};
pub use submission::{Attachment, Payload, Submission, SubmittedValue, UploadedFile};

use indexmap::IndexMap;
use tracing::{info, warn};

use formforge_core::{FormId, SessionId};
use formforge_storage::FormRepository;

/// Download name of every generated document.
pub const DOCUMENT_FILENAME: &str = "document.docx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedForm {
    pub form_id: FormId,
    pub label: String,
    pub instance: FormInstance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Ties the repository, the session store and the document service
/// together behind the operations a request handler needs.
pub struct Engine<R, S, D> {
    repository: R,
    sessions: S,
    documents: D,
    registry: FieldRegistry,
}

impl<R: FormRepository, S: SessionStore, D: DocumentService> Engine<R, S, D> {
    pub fn new(repository: R, sessions: S, documents: D) -> Self {
        Self {
            repository,
            sessions,
            documents,
            registry: FieldRegistry::default(),
        }
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn forms_index(&self) -> Result<IndexMap<String, FormId>, EngineError> {
        Ok(self.repository.get_forms_index()?)
    }

    /// Load a stored form and materialize it for display.
    pub fn render_form(&self, form_id: FormId) -> Result<RenderedForm, EngineError> {
        let (label, definition) = self.repository.get_form_by_id(form_id)?;
        let instance = generate_fields(&definition.fields, &self.registry);
        Ok(RenderedForm {
            form_id,
            label,
            instance,
        })
    }

    pub fn document_service_available(&self) -> bool {
        let available = self.documents.health_check();
        if !available {
            warn!("document service is not reachable");
        }
        available
    }

    /// Validate a submission against its form, regroup it, attach processed
    /// images and have the document service render the form's template.
    pub fn submit_form(
        &self,
        form_id: FormId,
        submission: &Submission,
    ) -> Result<GeneratedDocument, EngineError> {
        let rendered = self.render_form(form_id)?;
        rendered
            .instance
            .validate(submission)
            .map_err(EngineError::InvalidSubmission)?;

        let mut data = submission::regroup(submission);
        let attachments = submission::process_images(&mut data)?;
        let payload = serde_json::to_value(&data)?;
        let template = self.repository.get_doc_form(&rendered.label)?;

        let bytes = self
            .documents
            .generate_document(&template, &payload, &attachments)?;
        info!(
            %form_id,
            label = %rendered.label,
            attachments = attachments.len(),
            len = bytes.len(),
            "document generated"
        );
        Ok(GeneratedDocument {
            filename: DOCUMENT_FILENAME.to_string(),
            bytes,
        })
    }

    pub fn form_editor(&mut self, session: SessionId) -> FormEditor<'_, R, S> {
        FormEditor::new(
            &mut self.repository,
            &mut self.sessions,
            &self.registry,
            session,
        )
    }

    pub fn select_editor(&mut self, session: SessionId) -> SelectFieldEditor<'_, R, S> {
        SelectFieldEditor::new(
            &mut self.repository,
            &mut self.sessions,
            &self.registry,
            session,
        )
    }

    pub fn editor_choices(&self) -> Result<Vec<ChoiceGroup>, EngineError> {
        editor_choices(&self.repository)
    }
}
