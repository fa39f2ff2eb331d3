use momento_core::{Item, ItemId, ItemImage};

#[test]
fn item_new_is_unsaved_without_photo_or_dates() {
    let item = Item::new("Paris", "Day one");

    assert!(!item.is_persisted());
    assert_eq!(item.id, None);
    assert!(item.image.is_none());
    assert_eq!(item.created_at, None);
    assert_eq!(item.modified_at, None);
}

#[test]
fn builders_return_new_values() {
    let original = Item::new("Paris", "Day one");
    let persisted = original
        .clone()
        .with_id(ItemId(3))
        .with_timestamps(Some(10), Some(20));

    assert!(!original.is_persisted());
    assert!(persisted.is_persisted());
    assert_eq!(persisted.created_at, Some(10));
    assert_eq!(persisted.modified_at, Some(20));
}

#[test]
fn serialization_uses_column_names_and_skips_photo() {
    let image = ItemImage::from_rgba(1, 1, vec![255, 0, 0, 255]).expect("valid pixel buffer");
    let item = Item::new("Lisbon", "Tram 28")
        .with_id(ItemId(9))
        .with_image(Some(image))
        .with_timestamps(Some(1_700_000_000_000), Some(1_700_000_360_000));

    let json = serde_json::to_value(&item).expect("serialize");
    assert_eq!(json["id"], 9);
    assert_eq!(json["title"], "Lisbon");
    assert_eq!(json["content"], "Tram 28");
    assert_eq!(json["createdDate"], 1_700_000_000_000_i64);
    assert_eq!(json["modifiedDate"], 1_700_000_360_000_i64);
    assert!(json.get("image").is_none());

    let decoded: Item = serde_json::from_value(json).expect("deserialize");
    assert_eq!(decoded, item.with_image(None));
}

#[test]
fn image_debug_output_omits_pixels() {
    let image = ItemImage::from_rgba(2, 1, vec![1; 8]).expect("valid pixel buffer");
    assert_eq!(format!("{image:?}"), "ItemImage { width: 2, height: 1 }");
}
