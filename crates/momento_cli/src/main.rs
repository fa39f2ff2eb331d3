//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `momento_core` linkage without the mobile shell.
//! - List the entries of a journal file for quick local inspection.

use momento_core::{Item, ItemStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("momento_core ping={}", momento_core::ping());
    println!("momento_core version={}", momento_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match ItemStore::open(&db_path) {
        Ok(store) => {
            for item in store.snapshot() {
                println!("{}", describe(&item));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            ExitCode::FAILURE
        }
    }
}

fn describe(item: &Item) -> String {
    let id = item.id.map_or(0, |id| id.get());
    let photo = match &item.image {
        Some(image) => format!("{}x{}", image.width(), image.height()),
        None => "-".to_string(),
    };
    format!(
        "id={id} title={:?} created_ms={} modified_ms={} photo={photo}",
        item.title,
        item.created_at.map_or("-".to_string(), |ms| ms.to_string()),
        item.modified_at.map_or("-".to_string(), |ms| ms.to_string()),
    )
}
