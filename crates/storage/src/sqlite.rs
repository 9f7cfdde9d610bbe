use std::path::Path;

use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension, ffi, params};
use tracing::{debug, info, warn};

use formforge_core::{
    CoreError, Draft, FieldDefinition, FieldType, FormId, SelectBinding, SelectId, StaticField,
};

use crate::error::StorageError;
use crate::traits::FormRepository;

/// Map constraint failures onto the repository's error taxonomy.
/// `subject` names the row that collided, e.g. `form 'Survey'`.
fn classify(err: rusqlite::Error, subject: impl FnOnce() -> String) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StorageError::Conflict(subject());
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StorageError::ReferentialIntegrity(subject());
            }
            _ => {}
        }
    }
    StorageError::Sqlite(err)
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a database file, creating the schema if it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open a connection to an already initialized database.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn form_id_by_label(conn: &Connection, label: &str) -> Result<Option<FormId>, StorageError> {
    let id = conn
        .query_row(
            "SELECT id_form FROM form WHERE label_form = ?1",
            params![label],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(FormId::new))
}

fn select_id_by_label(conn: &Connection, label: &str) -> Result<Option<SelectId>, StorageError> {
    let id = conn
        .query_row(
            "SELECT id_select FROM select_field WHERE label_select = ?1",
            params![label],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(SelectId::new))
}

fn load_choices(conn: &Connection, select_id: SelectId) -> Result<Vec<String>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT name_choice FROM choice WHERE id_select = ?1 ORDER BY id_choice")?;
    let choices = stmt
        .query_map(params![select_id.get()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(choices)
}

/// Rebuild the field maps of one form from its `field` and `form_select` rows.
/// Rows are taken as stored; a name present in both tables is corruption.
fn load_fields(conn: &Connection, form_id: FormId) -> Result<Draft, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT name_field, type_field, label_field FROM field WHERE id_form = ?1 ORDER BY id_field",
    )?;
    let static_fields = stmt
        .query_map(params![form_id.get()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                StaticField {
                    field_type: FieldType::from_code(row.get::<_, i64>(1)?),
                    label: row.get::<_, String>(2)?,
                },
            ))
        })?
        .collect::<Result<IndexMap<_, _>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT fs.name_select, sf.label_select, sf.id_select
         FROM form_select fs JOIN select_field sf ON fs.id_select = sf.id_select
         WHERE fs.id_form = ?1 ORDER BY fs.id_fs",
    )?;
    let rows = stmt
        .query_map(params![form_id.get()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let mut select_fields = IndexMap::new();
    for (name, label, select_id) in rows {
        let choices = load_choices(conn, SelectId::new(select_id))?;
        select_fields.insert(name, SelectBinding { label, choices });
    }

    let draft = Draft::from_parts(static_fields, select_fields);
    if let Some(name) = draft.overlapping_names().first() {
        warn!(%form_id, name, "field stored as both static and select");
        return Err(StorageError::Corrupt(format!(
            "form {form_id}: field '{name}' is both a static field and a select field"
        )));
    }
    Ok(draft)
}

impl FormRepository for SqliteStorage {
    fn get_forms_index(&self) -> Result<IndexMap<String, FormId>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id_form, label_form FROM form ORDER BY id_form")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut index = IndexMap::new();
        for row in rows {
            let (id, label) = row?;
            index.insert(label, FormId::new(id));
        }
        Ok(index)
    }

    fn get_form_by_id(&self, form_id: FormId) -> Result<(String, FieldDefinition), StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT label_form, doc_form FROM form WHERE id_form = ?1",
                params![form_id.get()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        let (label, doc_form) =
            row.ok_or_else(|| StorageError::NotFound(format!("form {form_id}")))?;

        let fields = load_fields(&self.conn, form_id)?;
        debug!(%form_id, %label, fields = fields.len(), "loaded form");
        Ok((label, FieldDefinition { fields, doc_form }))
    }

    fn get_form_by_label(&self, label: &str) -> Result<FieldDefinition, StorageError> {
        let form_id = form_id_by_label(&self.conn, label)?
            .ok_or_else(|| StorageError::NotFound(format!("form '{label}'")))?;
        let (_, definition) = self.get_form_by_id(form_id)?;
        Ok(definition)
    }

    fn get_doc_form(&self, label: &str) -> Result<Vec<u8>, StorageError> {
        self.conn
            .query_row(
                "SELECT doc_form FROM form WHERE label_form = ?1",
                params![label],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("form '{label}'")))
    }

    fn get_select_labels(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT label_select FROM select_field ORDER BY id_select")?;
        let labels = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(labels)
    }

    fn get_choices(&self, select_label: &str) -> Result<Vec<String>, StorageError> {
        let select_id = select_id_by_label(&self.conn, select_label)?
            .ok_or_else(|| StorageError::NotFound(format!("select field '{select_label}'")))?;
        load_choices(&self.conn, select_id)
    }

    fn save_form(
        &mut self,
        label: &str,
        draft: &Draft,
        doc_form: &[u8],
    ) -> Result<FormId, StorageError> {
        draft.check_disjoint()?;

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO form (label_form, doc_form) VALUES (?1, ?2)",
            params![label, doc_form],
        )
        .map_err(|e| classify(e, || format!("form '{label}'")))?;
        let form_id = FormId::new(tx.last_insert_rowid());

        for (name, field) in draft.static_fields() {
            tx.execute(
                "INSERT INTO field (id_form, name_field, type_field, label_field) VALUES (?1, ?2, ?3, ?4)",
                params![form_id.get(), name, field.field_type.code(), field.label],
            )
            .map_err(|e| classify(e, || format!("field '{name}'")))?;
        }

        for (name, binding) in draft.select_fields() {
            // The select field may have been deleted since it was added to the draft.
            let select_id = select_id_by_label(&tx, &binding.label)?.ok_or_else(|| {
                StorageError::NotFound(format!("select field '{}'", binding.label))
            })?;
            tx.execute(
                "INSERT INTO form_select (id_form, id_select, name_select) VALUES (?1, ?2, ?3)",
                params![form_id.get(), select_id.get(), name],
            )
            .map_err(|e| classify(e, || format!("field '{name}'")))?;
        }

        tx.commit()?;
        info!(%form_id, %label, fields = draft.len(), "saved form");
        Ok(form_id)
    }

    fn delete_form(&mut self, label: &str) -> Result<bool, StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM form WHERE label_form = ?1", params![label])?;
        if deleted > 0 {
            info!(%label, "deleted form");
        }
        Ok(deleted > 0)
    }

    fn save_select_field(
        &mut self,
        label: &str,
        choices: &[String],
    ) -> Result<SelectId, StorageError> {
        if choices.is_empty() {
            return Err(CoreError::validation("choices", "a select field needs at least one choice").into());
        }

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO select_field (label_select) VALUES (?1)",
            params![label],
        )
        .map_err(|e| classify(e, || format!("select field '{label}'")))?;
        let select_id = SelectId::new(tx.last_insert_rowid());

        {
            let mut stmt = tx.prepare("INSERT INTO choice (id_select, name_choice) VALUES (?1, ?2)")?;
            for choice in choices {
                stmt.execute(params![select_id.get(), choice])?;
            }
        }

        tx.commit()?;
        info!(%select_id, %label, choices = choices.len(), "saved select field");
        Ok(select_id)
    }

    fn delete_select_field(&mut self, label: &str) -> Result<bool, StorageError> {
        let result = self
            .conn
            .execute("DELETE FROM select_field WHERE label_select = ?1", params![label]);
        match result {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(%label, "deleted select field");
                }
                Ok(deleted > 0)
            }
            Err(e) => {
                let err = classify(e, || format!("select field '{label}'"));
                if matches!(err, StorageError::ReferentialIntegrity(_)) {
                    warn!(%label, "refused to delete select field still bound to a form");
                }
                Err(err)
            }
        }
    }
}
