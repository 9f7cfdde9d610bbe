//! Submitted form data and its regrouping into the document payload.

use std::io::Cursor;
use std::path::Path;

use image::{GenericImageView, ImageFormat};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use formforge_core::{CoreError, validate::SUBMIT_KEY};

use crate::error::EngineError;
use crate::materialize::{IMAGE_TAG, KEY_SEPARATOR, SOURCE_SUBKEY, TYPE_SUBKEY};

/// Keys the form machinery adds to every submission.
pub const RESERVED_KEYS: [&str; 2] = ["csrf_token", SUBMIT_KEY];

pub const WIDTH_SUBKEY: &str = "__width";
pub const HEIGHT_SUBKEY: &str = "__height";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename).extension().and_then(|ext| ext.to_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedValue {
    Text(String),
    File(UploadedFile),
}

/// Raw key/value pairs of a submitted form: text fields first, then uploads,
/// each in the order received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
    values: IndexMap<String, SubmittedValue>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_text(key, value);
        self
    }

    pub fn file(mut self, key: impl Into<String>, file: UploadedFile) -> Self {
        self.push_file(key, file);
        self
    }

    pub fn push_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.values
            .insert(key.clone(), SubmittedValue::Text(value.clone()));
        self.fields.push((key, value));
    }

    pub fn push_file(&mut self, key: impl Into<String>, file: UploadedFile) {
        let key = key.into();
        self.values
            .insert(key.clone(), SubmittedValue::File(file.clone()));
        self.files.push((key, file));
    }

    /// Latest value submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&SubmittedValue> {
        self.values.get(key)
    }

    /// Text fields then files, in submission order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, SubmittedValue)> + '_ {
        let texts = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), SubmittedValue::Text(v.clone())));
        let files = self
            .files
            .iter()
            .map(|(k, f)| (k.as_str(), SubmittedValue::File(f.clone())));
        texts.chain(files)
    }
}

/// A value in the regrouped payload sent to the document service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Number(u64),
    File(UploadedFile),
    Group(IndexMap<String, Payload>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, Payload>> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl From<SubmittedValue> for Payload {
    fn from(value: SubmittedValue) -> Self {
        match value {
            SubmittedValue::Text(text) => Self::Text(text),
            SubmittedValue::File(file) => Self::File(file),
        }
    }
}

/// Files are referenced by name; their bytes travel as separate parts.
impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(n) => serializer.serialize_u64(*n),
            Self::File(file) => serializer.serialize_str(&file.filename),
            Self::Group(group) => group.serialize(serializer),
        }
    }
}

pub type PayloadMap = IndexMap<String, Payload>;

/// Fold `{group}-{subkey}` keys back into nested groups.
///
/// Keys are split at the first separator. Reserved keys are dropped. When a
/// plain key and a group share a name, the one submitted last wins.
pub fn regroup(submission: &Submission) -> PayloadMap {
    let mut data = PayloadMap::new();

    for (key, value) in submission.pairs() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }
        match key.split_once(KEY_SEPARATOR) {
            Some((group, subkey)) => {
                let entry = data
                    .entry(group.to_string())
                    .or_insert_with(|| Payload::Group(IndexMap::new()));
                if !matches!(entry, Payload::Group(_)) {
                    *entry = Payload::Group(IndexMap::new());
                }
                if let Payload::Group(members) = entry {
                    members.insert(subkey.to_string(), value.into());
                }
            }
            None => {
                data.insert(key.to_string(), value.into());
            }
        }
    }

    data
}

/// A generated file sent alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

fn format_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        other => other.extensions_str().first().copied().unwrap_or("bin"),
    }
}

/// Decode an upload, detect its format and re-encode it in that format.
fn reencode(bytes: &[u8]) -> Result<(ImageFormat, Vec<u8>, u32, u32), EngineError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = decoded.dimensions();
    let mut out = Cursor::new(Vec::new());
    decoded.write_to(&mut out, format)?;
    Ok((format, out.into_inner(), width, height))
}

/// Post-process every group tagged as an image: the upload is re-encoded and
/// emitted as an attachment, `source` becomes the attachment's generated
/// name, and `__width`/`__height` are recorded.
pub fn process_images(data: &mut PayloadMap) -> Result<Vec<Attachment>, EngineError> {
    let mut attachments = Vec::new();

    for (name, value) in data.iter_mut() {
        let Payload::Group(group) = value else {
            continue;
        };
        if group.get(TYPE_SUBKEY).and_then(Payload::as_text) != Some(IMAGE_TAG) {
            continue;
        }

        let Some(Payload::File(upload)) = group.get(SOURCE_SUBKEY) else {
            return Err(CoreError::validation(
                format!("{name}{KEY_SEPARATOR}{SOURCE_SUBKEY}"),
                "an image upload is required",
            )
            .into());
        };

        let (format, bytes, width, height) = reencode(&upload.bytes)?;
        let filename = format!("image{}.{}", attachments.len(), format_extension(format));
        debug!(field = %name, %filename, width, height, "processed image upload");

        group.insert(SOURCE_SUBKEY.to_string(), Payload::Text(filename.clone()));
        group.insert(HEIGHT_SUBKEY.to_string(), Payload::Number(u64::from(height)));
        group.insert(WIDTH_SUBKEY.to_string(), Payload::Number(u64::from(width)));
        attachments.push(Attachment {
            filename,
            bytes,
            mime: format.to_mime_type().to_string(),
        });
    }

    Ok(attachments)
}
