//! Collapse duplicate audio uploads
//!
//! The pipeline delivers callbacks at least once, so the same storage path
//! can be recorded several times. Reads keep one row per path: the most
//! recently created one, at the position where the path first appeared.

use std::collections::HashMap;

use crate::models::AudioFile;

/// Keep one row per `storage_path`.
///
/// A later row replaces the retained one only when both carry a timestamp
/// and the new one is strictly later; a row with a missing timestamp never
/// displaces anything, and a retained row without a timestamp is kept.
/// Idempotent: `dedup_latest(dedup_latest(x)) == dedup_latest(x)`.
pub fn dedup_latest(files: Vec<AudioFile>) -> Vec<AudioFile> {
    let mut retained: Vec<AudioFile> = Vec::with_capacity(files.len());
    let mut index_by_path: HashMap<String, usize> = HashMap::new();

    for file in files {
        match index_by_path.get(&file.storage_path) {
            None => {
                index_by_path.insert(file.storage_path.clone(), retained.len());
                retained.push(file);
            }
            Some(&idx) => {
                if supersedes(&file, &retained[idx]) {
                    retained[idx] = file;
                }
            }
        }
    }

    retained
}

fn supersedes(candidate: &AudioFile, current: &AudioFile) -> bool {
    match (candidate.created_at, current.created_at) {
        (Some(new), Some(old)) => new > old,
        _ => false,
    }
}
