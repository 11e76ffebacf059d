use std::collections::HashSet;

use indexmap::IndexMap;

use crate::domain::entities::photo::{photo_key, PhotoPayload, PhotoReplacement};
use crate::errors::StoreResult;
use crate::usecase::ports::archive::ArchiveReader;

/// Final archive contents, filename -> bytes, in write order.
pub type ArchiveContents = IndexMap<String, Vec<u8>>;

/// Names of original archive files that a staged replacement supersedes,
/// already normalised through [`photo_key`].
pub fn superseded_photos(replacements: &IndexMap<String, PhotoReplacement>) -> HashSet<String> {
    replacements
        .values()
        .filter_map(|replacement| replacement.original_filename.as_deref())
        .filter(|name| !name.is_empty())
        .map(photo_key)
        .collect()
}

/// Copies every surviving original file, then writes new-person photos and
/// replacement photos over the top. Later staged files win on a filename
/// collision.
pub fn reconcile_photos<'a>(
    original: Option<&dyn ArchiveReader>,
    replacements: &IndexMap<String, PhotoReplacement>,
    new_person_photos: impl IntoIterator<Item = &'a PhotoPayload>,
) -> StoreResult<ArchiveContents> {
    let superseded = superseded_photos(replacements);
    let mut contents = ArchiveContents::new();
    let mut skipped = 0_usize;

    if let Some(reader) = original {
        for entry in reader.entries()? {
            if entry.is_dir {
                continue;
            }
            if superseded.contains(&photo_key(&entry.name)) {
                skipped += 1;
                continue;
            }
            let bytes = reader.read(&entry.name)?;
            contents.insert(entry.name, bytes);
        }
    }
    let copied = contents.len();

    for photo in new_person_photos {
        contents.insert(photo.filename.clone(), photo.bytes.clone());
    }
    for replacement in replacements.values() {
        contents.insert(
            replacement.new_filename.clone(),
            replacement.new_file.clone(),
        );
    }

    tracing::info!(
        copied,
        skipped,
        total = contents.len(),
        "reconciled photo archive"
    );
    Ok(contents)
}

/// Finds the archive entry for a `ProfilePhoto` value: an exact name first,
/// then any file entry whose [`photo_key`] matches.
pub fn find_photo(reader: &dyn ArchiveReader, name: &str) -> StoreResult<Option<String>> {
    if name.is_empty() {
        return Ok(None);
    }
    let entries = reader.entries()?;
    if let Some(entry) = entries.iter().find(|e| !e.is_dir && e.name == name) {
        return Ok(Some(entry.name.clone()));
    }
    let key = photo_key(name);
    Ok(entries
        .into_iter()
        .find(|e| !e.is_dir && photo_key(&e.name) == key)
        .map(|e| e.name))
}
