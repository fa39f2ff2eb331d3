//! FFI use-case API for the mobile UI shell.
//!
//! # Responsibility
//! - Expose form-level journal operations to Dart via FRB.
//! - Own the process-wide store, controller and runtime.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Write functions return after the write completed, so the UI can report
//!   the outcome; the core controller itself stays fire-and-forget.

use momento_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EntryDraft, FileContentResolver, ImageRef, Item, ItemController, ItemId, ItemStore,
};
use log::warn;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

const ENTRY_DB_FILE_NAME: &str = "travel_momento.sqlite3";
const ENTRY_DB_PATH_ENV: &str = "MOMENTO_DB_PATH";

static ENTRY_DB_PATH: OnceCell<PathBuf> = OnceCell::new();
static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static CONTROLLER: OnceCell<ItemController> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the journal database file before first use.
///
/// # FFI contract
/// - Must be called before any `entry_*` function to take effect.
/// - Repeating the same path is accepted; a different path is rejected.
/// - Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_entry_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = ENTRY_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "entry DB already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Journal entry as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItemView {
    pub item_id: i64,
    pub title: String,
    pub content: String,
    /// Photo re-encoded as PNG.
    pub image_png: Option<Vec<u8>>,
    pub created_at_ms: Option<i64>,
    pub modified_at_ms: Option<i64>,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListResponse {
    pub items: Vec<EntryItemView>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    pub item_id: Option<i64>,
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, item_id: i64) -> Self {
        Self {
            ok: true,
            item_id: Some(item_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item_id: None,
            message: message.into(),
        }
    }
}

/// True iff both fields are non-blank after trimming.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_is_valid(title: String, content: String) -> bool {
    momento_core::validate_entry(&title, &content).is_ok()
}

/// Creates a journal entry, optionally with a photo file.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_add_item(
    title: String,
    content: String,
    image_path: Option<String>,
) -> EntryActionResponse {
    let result = with_controller(|runtime, controller| {
        let mut draft = EntryDraft::new();
        draft.set_title(title);
        draft.set_content(content);
        if let Some(path) = image_path {
            draft.select_image(ImageRef::new(path));
        }
        runtime
            .block_on(draft.save(controller))
            .map_err(|err| err.to_string())
    });

    match result.and_then(|item| persisted_id(&item)) {
        Ok(item_id) => EntryActionResponse::success("Entry saved.", item_id),
        Err(err) => EntryActionResponse::failure(format!("entry_add_item failed: {err}")),
    }
}

/// Replaces an entry's title and content; a given photo replaces the stored one.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update_item(
    item_id: i64,
    title: String,
    content: String,
    image_path: Option<String>,
) -> EntryActionResponse {
    let result = with_controller(|runtime, controller| {
        let existing = controller
            .store()
            .get(ItemId(item_id))
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("item not found: {item_id}"))?;

        let mut draft = EntryDraft::edit(existing);
        draft.set_title(title);
        draft.set_content(content);
        if let Some(path) = image_path {
            draft.select_image(ImageRef::new(path));
        }
        runtime
            .block_on(draft.save(controller))
            .map_err(|err| err.to_string())
    });

    match result.and_then(|item| persisted_id(&item)) {
        Ok(item_id) => EntryActionResponse::success("Entry updated.", item_id),
        Err(err) => EntryActionResponse::failure(format!("entry_update_item failed: {err}")),
    }
}

/// Deletes an entry. Deleting a missing entry succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_item(item_id: i64) -> EntryActionResponse {
    let result = with_controller(|runtime, controller| {
        let target = Item::new(String::new(), String::new()).with_id(ItemId(item_id));
        runtime
            .block_on(controller.delete(&target).wait())
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(()) => EntryActionResponse::success("Entry deleted.", item_id),
        Err(err) => EntryActionResponse::failure(format!("entry_delete_item failed: {err}")),
    }
}

/// Loads one entry; `None` when missing or on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_get_item(item_id: i64) -> Option<EntryItemView> {
    let result = with_controller(|_, controller| {
        controller
            .store()
            .get(ItemId(item_id))
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(item) => item.map(to_entry_item_view),
        Err(err) => {
            warn!("event=entry_get module=ffi status=error error={err}");
            None
        }
    }
}

/// Lists every entry from the latest store snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_items() -> EntryListResponse {
    match with_controller(|_, controller| Ok(controller.all_items().current())) {
        Ok(items) => {
            let items = items
                .into_iter()
                .map(to_entry_item_view)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No entries.".to_string()
            } else {
                format!("Found {} entry(ies).", items.len())
            };
            EntryListResponse { items, message }
        }
        Err(err) => EntryListResponse {
            items: Vec::new(),
            message: format!("entry_list_items failed: {err}"),
        },
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ENTRY_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn with_controller<T>(
    f: impl FnOnce(&Runtime, &ItemController) -> Result<T, String>,
) -> Result<T, String> {
    let runtime = RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("momento-writer")
            .enable_all()
            .build()
            .map_err(|err| format!("runtime init failed: {err}"))
    })?;

    let controller = CONTROLLER.get_or_try_init(|| {
        let store = ItemStore::open(resolve_entry_db_path())
            .map_err(|err| format!("entry DB open failed: {err}"))?;
        Ok::<_, String>(ItemController::new(
            store,
            Arc::new(FileContentResolver),
            runtime.handle().clone(),
        ))
    })?;

    f(runtime, controller)
}

fn persisted_id(item: &Item) -> Result<i64, String> {
    item.id
        .map(ItemId::get)
        .ok_or_else(|| "saved entry has no id".to_string())
}

fn to_entry_item_view(item: Item) -> EntryItemView {
    let image_png = item.image.as_ref().and_then(|image| match image.encode_png() {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!("event=entry_image_encode module=ffi status=error error={err}");
            None
        }
    });
    EntryItemView {
        item_id: item.id.map_or(0, ItemId::get),
        title: item.title,
        content: item.content,
        image_png,
        created_at_ms: item.created_at,
        modified_at_ms: item.modified_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_entry_db_path, core_version, entry_add_item, entry_delete_item, entry_get_item,
        entry_is_valid, entry_list_items, entry_update_item, init_logging, ping,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DB_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();

    fn configure_test_db() {
        let dir = TEST_DB_DIR.get_or_init(|| tempfile::tempdir().expect("temp dir"));
        let path: PathBuf = dir.path().join("ffi.sqlite3");
        let error = configure_entry_db_path(path.display().to_string());
        assert!(error.is_empty(), "{error}");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_rejects_switching_paths() {
        configure_test_db();
        let error = configure_entry_db_path("/tmp/somewhere-else.sqlite3".to_string());
        assert!(error.contains("refusing to switch"));
    }

    #[test]
    fn entry_is_valid_trims_input() {
        assert!(entry_is_valid("Paris".to_string(), "Day one".to_string()));
        assert!(!entry_is_valid("  ".to_string(), "Day one".to_string()));
    }

    #[test]
    fn add_update_delete_flow() {
        configure_test_db();
        let title = unique_token("ffi-add");

        let created = entry_add_item(title.clone(), "Day one".to_string(), None);
        assert!(created.ok, "{}", created.message);
        let item_id = created.item_id.expect("add should return item_id");

        let listed = entry_list_items();
        assert!(listed.items.iter().any(|item| item.item_id == item_id));

        let updated = entry_update_item(item_id, title.clone(), "Day two".to_string(), None);
        assert!(updated.ok, "{}", updated.message);
        let view = entry_get_item(item_id).expect("item should exist");
        assert_eq!(view.content, "Day two");
        assert!(view.modified_at_ms >= view.created_at_ms);

        let deleted = entry_delete_item(item_id);
        assert!(deleted.ok, "{}", deleted.message);
        assert!(entry_get_item(item_id).is_none());

        let deleted_again = entry_delete_item(item_id);
        assert!(deleted_again.ok, "{}", deleted_again.message);
    }

    #[test]
    fn add_rejects_blank_content() {
        configure_test_db();
        let response = entry_add_item(unique_token("ffi-blank"), "   ".to_string(), None);
        assert!(!response.ok);
        assert!(response.message.contains("content must not be blank"));
    }

    #[test]
    fn add_stores_photo_from_file() {
        configure_test_db();
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("photo.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write photo");

        let created = entry_add_item(
            unique_token("ffi-photo"),
            "With photo".to_string(),
            Some(path.display().to_string()),
        );
        assert!(created.ok, "{}", created.message);

        let view = entry_get_item(created.item_id.expect("created id")).expect("created item is readable");
        assert!(view.image_png.is_some());
    }

    #[test]
    fn update_missing_item_fails() {
        configure_test_db();
        let response = entry_update_item(
            i64::MAX,
            "Nowhere".to_string(),
            "Nothing".to_string(),
            None,
        );
        assert!(!response.ok);
        assert!(response.message.contains("not found"));
    }
}
