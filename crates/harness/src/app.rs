use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use tempfile::TempDir;

use formforge_core::{FieldType, FormId, SessionId};
use formforge_engine::{Engine, FormEditor, MemorySessionStore, SelectFieldEditor};
use formforge_storage::Database;

use crate::documents::RecordingDocumentService;

pub type TestEngine = Engine<Database, MemorySessionStore, RecordingDocumentService>;

/// An engine over a fresh on-disk database, with one browser session.
pub struct TestApp {
    pub engine: TestEngine,
    pub session: SessionId,
    dir: TempDir,
}

impl TestApp {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_documents(RecordingDocumentService::new())
    }

    pub fn with_documents(
        documents: RecordingDocumentService,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let database = Database::initialize(dir.path().join("formforge.db"))?;
        Ok(Self {
            engine: Engine::new(database, MemorySessionStore::new(), documents),
            session: SessionId::new(),
            dir,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("formforge.db")
    }

    pub fn documents(&self) -> &RecordingDocumentService {
        self.engine.documents()
    }

    pub fn editor(&mut self) -> FormEditor<'_, Database, MemorySessionStore> {
        self.engine.form_editor(self.session)
    }

    pub fn select_editor(&mut self) -> SelectFieldEditor<'_, Database, MemorySessionStore> {
        self.engine.select_editor(self.session)
    }

    /// Build and save a select field through the choice editor.
    pub fn create_select(
        &mut self,
        label: &str,
        choices: &[&str],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut editor = self.select_editor();
        for choice in choices {
            editor.add_choice(choice)?;
        }
        editor.commit(label)?;
        Ok(())
    }

    /// The `Survey` form: `name` as a text field and `favorite` bound to a
    /// `Color` select field offering Red and Blue.
    pub fn create_survey(&mut self) -> Result<FormId, Box<dyn std::error::Error>> {
        self.create_select("Color", &["Red", "Blue"])?;
        let mut editor = self.editor();
        editor.add_static("name", FieldType::Text, "Name")?;
        editor.add_select("favorite", "Color")?;
        Ok(editor.commit("Survey", b"survey template")?)
    }
}

/// Encode a blank image of the given size as PNG.
pub fn png(width: u32, height: u32) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
