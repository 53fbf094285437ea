//! Folder import
//!
//! Walks a folder for image files and adds one slide per image to the
//! catalog. The description is derived from the file name.

use std::path::{Path, PathBuf};

use tokio::task;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::state::data::SlideRecord;
use crate::state::library::SlideLibrary;

/// Image extensions picked up by the import (lowercase)
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Result of a folder import operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    /// Images already in the catalog
    pub skipped: usize,
}

/// Import every image under `folder` into `library`, in file name order.
pub fn import_folder(library: &mut SlideLibrary, folder: &Path) -> Result<ImportResult> {
    info!("Scanning folder: {}", folder.display());

    let mut known = library.image_paths()?;
    let mut records = Vec::new();
    let mut skipped = 0;

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                None
            }
        })
    {
        let path = entry.path();
        if !path.is_file() || !is_image(path) {
            continue;
        }

        let path_str = path.to_string_lossy().to_string();
        if !known.insert(path_str.clone()) {
            skipped += 1;
            continue;
        }

        records.push(SlideRecord::new(path_str, describe(path)));
    }

    let imported = library.insert_many(&records)?.len();
    info!("Import complete: {} new, {} skipped", imported, skipped);

    Ok(ImportResult { imported, skipped })
}

/// Run [`import_folder`] on the blocking pool.
///
/// The import opens its own connection to `db_path`; a
/// `rusqlite::Connection` cannot be shared with the caller's thread.
pub async fn import_folder_async(folder: PathBuf, db_path: PathBuf) -> Result<ImportResult> {
    task::spawn_blocking(move || -> Result<ImportResult> {
        let mut library = SlideLibrary::open(&db_path)?;
        let result = import_folder(&mut library, &folder)?;
        library.close()?;
        Ok(result)
    })
    .await?
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// "lake_bled-slovenia.jpg" -> "lake bled slovenia"
fn describe(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let words: Vec<&str> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        stem
    } else {
        words.join(" ")
    }
}
