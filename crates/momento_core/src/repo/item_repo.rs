//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/update/delete/get/list over the single `items` table.
//! - Keep SQL and blob encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - `createdDate` is never written by updates.
//! - `modifiedDate` never decreases and never drops below `createdDate`.
//! - Strict read paths reject invalid persisted state instead of masking it;
//!   only `list_items_lenient` degrades an undecodable photo to `None`.

use crate::db::DbError;
use crate::model::item::{now_epoch_ms, Item, ItemId, ItemImage, ItemValidationError};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    image,
    createdDate,
    modifiedDate
FROM items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    /// Operation needs a persisted item but got one without `id`.
    Unsaved,
    InvalidData(String),
}

impl RepoError {
    /// True when the underlying medium failed (as opposed to bad input).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::Unsaved => write!(f, "item has not been saved yet"),
            Self::InvalidData(message) => write!(f, "invalid item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Unsaved | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for journal item CRUD.
pub trait ItemRepository {
    /// Persists a new row and returns its fresh id. Any id on `item` is ignored.
    fn insert_item(&self, item: &Item) -> RepoResult<ItemId>;
    /// Replaces title/content/image and restamps `modifiedDate` of an existing row.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    /// Removes a row; returns whether one existed.
    fn delete_item(&self, id: ItemId) -> RepoResult<bool>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// All rows in insertion order.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists all rows for display, loading rows with an undecodable photo
    /// blob with `image: None` instead of failing the whole list.
    ///
    /// Only transport errors fail; `list_items` stays strict.
    pub fn list_items_lenient(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            let raw = read_raw_row(row)?;
            let id = raw.id;
            match raw.into_item_lenient() {
                Ok(item) => items.push(item),
                Err(err) => warn!(
                    "event=item_publish module=repo status=error item_id={id} error_code=row_skipped error={err}"
                ),
            }
        }

        Ok(items)
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, item: &Item) -> RepoResult<ItemId> {
        let now = now_epoch_ms();
        let created_at = item.created_at.or(item.modified_at).unwrap_or(now);
        let modified_at = item.modified_at.unwrap_or(created_at);
        let stamped = Item {
            id: None,
            ..item.clone()
        }
        .with_timestamps(Some(created_at), Some(modified_at));
        stamped.validate()?;

        let image_blob = encode_image(stamped.image.as_ref())?;
        self.conn.execute(
            "INSERT INTO items (
                title,
                content,
                image,
                createdDate,
                modifiedDate
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                stamped.title.as_str(),
                stamped.content.as_str(),
                image_blob,
                stamped.created_at,
                stamped.modified_at,
            ],
        )?;

        Ok(ItemId(self.conn.last_insert_rowid()))
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;
        let id = item.id.ok_or(RepoError::Unsaved)?;

        let image_blob = encode_image(item.image.as_ref())?;
        let changed = self.conn.execute(
            "UPDATE items
             SET
                title = ?1,
                content = ?2,
                image = ?3,
                modifiedDate = CASE
                    WHEN ?4 IS NULL THEN modifiedDate
                    ELSE MAX(?4, COALESCE(createdDate, ?4), COALESCE(modifiedDate, ?4))
                END
             WHERE id = ?5;",
            params![
                item.title.as_str(),
                item.content.as_str(),
                image_blob,
                item.modified_at,
                id.get(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1;", [id.get()])?;
        Ok(changed > 0)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.get()], read_raw_row)
            .optional()?;
        row.map(RawItemRow::into_item).transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(read_raw_row(row)?.into_item()?);
        }

        Ok(items)
    }
}

struct RawItemRow {
    id: i64,
    title: String,
    content: String,
    image: Option<Vec<u8>>,
    created_at: Option<i64>,
    modified_at: Option<i64>,
}

impl RawItemRow {
    fn into_item(self) -> RepoResult<Item> {
        let image = match self.image.as_deref() {
            Some(blob) => Some(ItemImage::decode(blob).map_err(|err| {
                RepoError::InvalidData(format!("items.image for id {}: {err}", self.id))
            })?),
            None => None,
        };
        self.into_item_with(image)
    }

    fn into_item_lenient(self) -> RepoResult<Item> {
        let image = match self.image.as_deref().map(ItemImage::decode) {
            Some(Ok(image)) => Some(image),
            Some(Err(err)) => {
                warn!(
                    "event=item_image_load module=repo status=error item_id={} error_code=image_dropped error={err}",
                    self.id
                );
                None
            }
            None => None,
        };
        self.into_item_with(image)
    }

    fn into_item_with(self, image: Option<ItemImage>) -> RepoResult<Item> {
        let item = Item {
            id: Some(ItemId(self.id)),
            title: self.title,
            content: self.content,
            image,
            created_at: self.created_at,
            modified_at: self.modified_at,
        };
        item.validate()?;
        Ok(item)
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawItemRow> {
    Ok(RawItemRow {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        image: row.get("image")?,
        created_at: row.get("createdDate")?,
        modified_at: row.get("modifiedDate")?,
    })
}

fn encode_image(image: Option<&ItemImage>) -> RepoResult<Option<Vec<u8>>> {
    image
        .map(|image| {
            image
                .encode_png()
                .map_err(|err| RepoError::InvalidData(format!("image encoding failed: {err}")))
        })
        .transpose()
}
