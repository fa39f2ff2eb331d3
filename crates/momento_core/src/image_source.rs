//! Photo source resolution and decoding.
//!
//! # Responsibility
//! - Resolve opaque external photo references into raw bytes.
//! - Decode raw bytes into an in-memory `ItemImage`.
//!
//! # Invariants
//! - An absent source always yields an absent image.
//! - Resolution and decode failures surface as `DecodeError`, never panics.

use crate::model::item::ItemImage;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Opaque reference to a user-picked photo (for example a `file://` URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Photo resolution/decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Reference cannot be mapped to any readable location.
    Unresolvable(String),
    /// Reference resolved but its bytes could not be read.
    Unreadable { reference: String, message: String },
    /// Bytes are not a supported image format.
    Malformed(String),
    /// Source is empty or decodes to zero pixels.
    Empty,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolvable(reference) => {
                write!(f, "image source cannot be resolved: `{reference}`")
            }
            Self::Unreadable { reference, message } => {
                write!(f, "image source `{reference}` is unreadable: {message}")
            }
            Self::Malformed(message) => write!(f, "image data is malformed: {message}"),
            Self::Empty => write!(f, "image source is empty"),
        }
    }
}

impl Error for DecodeError {}

/// Platform capability that turns a photo reference into raw bytes.
pub trait ContentResolver: Send + Sync {
    fn open(&self, reference: &ImageRef) -> Result<Vec<u8>, DecodeError>;
}

impl<F> ContentResolver for F
where
    F: Fn(&ImageRef) -> Result<Vec<u8>, DecodeError> + Send + Sync,
{
    fn open(&self, reference: &ImageRef) -> Result<Vec<u8>, DecodeError> {
        self(reference)
    }
}

/// Resolves absolute paths and `file://` URIs from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContentResolver;

impl FileContentResolver {
    fn resolve_path(reference: &ImageRef) -> Result<PathBuf, DecodeError> {
        let raw = reference.as_str().trim();
        let path_text = raw.strip_prefix(FILE_SCHEME).unwrap_or(raw);
        let path = Path::new(path_text);
        if path_text.is_empty() || !path.is_absolute() {
            return Err(DecodeError::Unresolvable(raw.to_string()));
        }
        Ok(path.to_path_buf())
    }
}

impl ContentResolver for FileContentResolver {
    fn open(&self, reference: &ImageRef) -> Result<Vec<u8>, DecodeError> {
        let path = Self::resolve_path(reference)?;
        std::fs::read(&path).map_err(|err| DecodeError::Unreadable {
            reference: reference.to_string(),
            message: err.to_string(),
        })
    }
}

/// Resolves and decodes an optional photo source.
///
/// `None` in, `Ok(None)` out.
pub fn decode_image(
    resolver: &dyn ContentResolver,
    source: Option<&ImageRef>,
) -> Result<Option<ItemImage>, DecodeError> {
    let Some(source) = source else {
        return Ok(None);
    };

    let decoded = resolver
        .open(source)
        .and_then(|bytes| ItemImage::decode(&bytes));
    match decoded {
        Ok(image) => Ok(Some(image)),
        Err(err) => {
            // Reference may be a user path; keep it out of logs.
            warn!(
                "event=image_decode module=image_source status=error error_code={}",
                error_code(&err)
            );
            Err(err)
        }
    }
}

fn error_code(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::Unresolvable(_) => "unresolvable",
        DecodeError::Unreadable { .. } => "unreadable",
        DecodeError::Malformed(_) => "malformed",
        DecodeError::Empty => "empty",
    }
}
