//! Journal item domain model.
//!
//! # Responsibility
//! - Define the persisted journal entry and its decoded photo.
//! - Provide the timestamp and identity checks enforced by storage.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never reused.
//! - `created_at` is written once and never changes afterwards.
//! - `modified_at` should not be earlier than `created_at` when both are set.
//! - Title/content blankness is a caller concern, not a model invariant.

use crate::image_source::DecodeError;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned identity of a journal item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Decoded RGBA photo attached to an item.
///
/// Pixels sit behind an `Arc`, so list snapshots clone in O(1).
#[derive(Clone, PartialEq, Eq)]
pub struct ItemImage(Arc<RgbaImage>);

impl ItemImage {
    /// Wraps raw RGBA8 pixels. Returns `None` for zero-sized or short buffers.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        RgbaImage::from_raw(width, height, pixels).map(Self::from)
    }

    /// Decodes an encoded image (PNG or JPEG) into RGBA pixels.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| DecodeError::Malformed(err.to_string()))?;
        let rgba = decoded.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(DecodeError::Empty);
        }
        Ok(Self::from(rgba))
    }

    /// Encodes pixels as PNG; this is the blob layout used by storage.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.0.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }
}

impl From<RgbaImage> for ItemImage {
    fn from(value: RgbaImage) -> Self {
        Self(Arc::new(value))
    }
}

impl Debug for ItemImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Validation errors for timestamp and identity invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Persisted ids are strictly positive.
    NonPositiveId(i64),
    /// `modified_at` is earlier than `created_at`.
    ModifiedBeforeCreated { created_at: i64, modified_at: i64 },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "item id must be positive, got {id}"),
            Self::ModifiedBeforeCreated {
                created_at,
                modified_at,
            } => write!(
                f,
                "modifiedDate ({modified_at}) must be >= createdDate ({created_at})"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// One travel journal entry.
///
/// Serialized with the storage column names. The photo is not part of the
/// serde shape; it travels as a PNG blob through storage and FFI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// `None` until the store assigns an identity.
    pub id: Option<ItemId>,
    pub title: String,
    pub content: String,
    #[serde(skip)]
    pub image: Option<ItemImage>,
    /// Unix epoch milliseconds.
    #[serde(rename = "createdDate")]
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds. Should be >= `created_at` when set.
    #[serde(rename = "modifiedDate")]
    pub modified_at: Option<i64>,
}

impl Item {
    /// Creates an unsaved item without photo or timestamps.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            image: None,
            created_at: None,
            modified_at: None,
        }
    }

    /// Returns a copy carrying the given photo.
    pub fn with_image(self, image: Option<ItemImage>) -> Self {
        Self { image, ..self }
    }

    /// Returns a copy carrying the given timestamps.
    pub fn with_timestamps(self, created_at: Option<i64>, modified_at: Option<i64>) -> Self {
        Self {
            created_at,
            modified_at,
            ..self
        }
    }

    /// Returns a copy bound to an existing identity.
    pub fn with_id(self, id: ItemId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks identity and timestamp ordering.
    ///
    /// Blank title/content pass; the controller rejects them before writes.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if let Some(ItemId(raw)) = self.id {
            if raw <= 0 {
                return Err(ItemValidationError::NonPositiveId(raw));
            }
        }

        if let (Some(created_at), Some(modified_at)) = (self.created_at, self.modified_at) {
            if modified_at < created_at {
                return Err(ItemValidationError::ModifiedBeforeCreated {
                    created_at,
                    modified_at,
                });
            }
        }

        Ok(())
    }
}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
