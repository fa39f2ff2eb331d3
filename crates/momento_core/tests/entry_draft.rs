use momento_core::{
    EntryDraft, EntryError, EntryState, FileContentResolver, ImageRef, ItemController, ItemImage,
    ItemStore,
};
use std::sync::Arc;
use tokio::runtime::Handle;

fn controller() -> ItemController {
    let store = ItemStore::open_in_memory().expect("open in-memory store");
    ItemController::new(store, Arc::new(FileContentResolver), Handle::current())
}

#[tokio::test]
async fn create_mode_save_moves_to_saved() {
    let controller = controller();
    let mut draft = EntryDraft::new();
    draft.set_title("Marrakesh");
    draft.set_content("Jemaa el-Fnaa");
    assert!(draft.is_valid(&controller));

    let saved = draft.save(&controller).await.expect("save completes");
    let id = saved.id.expect("persisted id");
    assert_eq!(draft.state(), EntryState::Saved(id));
    assert_eq!(controller.store().snapshot(), vec![saved]);
}

#[tokio::test]
async fn invalid_draft_is_not_saved() {
    let controller = controller();
    let mut draft = EntryDraft::new();
    draft.set_title("Marrakesh");

    let err = draft.save(&controller).await.unwrap_err();
    assert!(matches!(err, EntryError::Validation(_)));
    assert_eq!(draft.state(), EntryState::Unsaved);
    assert!(controller.store().snapshot().is_empty());
}

#[tokio::test]
async fn second_save_updates_and_keeps_created_date_and_photo() {
    let controller = controller();
    let dir = tempfile::tempdir().expect("create temp dir");
    let photo = ItemImage::from_rgba(2, 3, vec![90; 24]).expect("valid pixel buffer");
    let path = dir.path().join("souk.png");
    std::fs::write(&path, photo.encode_png().expect("png encode")).expect("write file");

    let mut draft = EntryDraft::new();
    draft.set_title("Fes");
    draft.set_content("Tanneries");
    draft.select_image(ImageRef::new(path.display().to_string()));
    let first = draft.save(&controller).await.expect("save completes");
    assert!(draft.selected_image().is_none());

    draft.set_content("Tanneries and the medina");
    let second = draft.save(&controller).await.expect("save completes");

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.image, Some(photo));
    assert_eq!(controller.store().snapshot().len(), 1);
}

#[tokio::test]
async fn edit_mode_binds_fields_from_item() {
    let controller = controller();
    let saved = controller
        .add_new("Hoi An", "Lanterns", None)
        .expect("valid entry")
        .wait()
        .await
        .expect("write completes");

    let mut draft = EntryDraft::edit(saved.clone());
    assert_eq!(draft.title(), "Hoi An");
    assert_eq!(draft.content(), "Lanterns");
    assert_eq!(draft.state(), EntryState::Saved(saved.id.expect("persisted id")));

    draft.set_title("Hoi An old town");
    let updated = draft.save(&controller).await.expect("save completes");
    assert_eq!(updated.title, "Hoi An old town");
    assert_eq!(updated.created_at, saved.created_at);
}

#[tokio::test]
async fn deleted_draft_is_terminal() {
    let controller = controller();
    let mut draft = EntryDraft::new();
    draft.set_title("Havana");
    draft.set_content("Malecon");
    let saved = draft.save(&controller).await.expect("save completes");
    let id = saved.id.expect("persisted id");

    draft.delete(&controller).await.expect("delete completes");
    assert_eq!(draft.state(), EntryState::Deleted(id));
    assert!(controller.store().get(id).expect("lookup").is_none());

    draft.delete(&controller).await.expect("delete completes");
    let err = draft.save(&controller).await.unwrap_err();
    assert!(matches!(err, EntryError::Deleted(deleted) if deleted == id));
}

#[tokio::test]
async fn edit_mode_fresh_photo_replaces_stored_one() {
    let controller = controller();
    let dir = tempfile::tempdir().expect("temp dir");
    let stored = ItemImage::from_rgba(1, 1, vec![0, 0, 0, 255]).expect("valid pixels");
    let fresh = ItemImage::from_rgba(3, 2, vec![200; 24]).expect("valid pixels");
    let fresh_path = dir.path().join("fresh.png");
    std::fs::write(&fresh_path, fresh.encode_png().expect("png encode")).expect("write photo");

    let stored_path = dir.path().join("stored.png");
    std::fs::write(&stored_path, stored.encode_png().expect("png encode")).expect("write photo");
    let saved = controller
        .add_new(
            "Petra",
            "Treasury",
            Some(&ImageRef::new(stored_path.display().to_string())),
        )
        .expect("valid entry")
        .wait()
        .await
        .expect("insert should complete");
    assert_eq!(saved.image, Some(stored));

    let mut draft = EntryDraft::edit(saved.clone());
    draft.select_image(ImageRef::new(fresh_path.display().to_string()));
    let updated = draft.save(&controller).await.expect("update should complete");

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.image, Some(fresh.clone()));
    let persisted = controller
        .store()
        .get(saved.id.expect("saved id"))
        .expect("lookup")
        .expect("row exists");
    assert_eq!(persisted.image, Some(fresh));
}
