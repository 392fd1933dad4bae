use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use itertools::{Either::*, Itertools};
use walkdir::WalkDir;

use crate::library::{definitions::VIDEO_EXTENSIONS, errors::BatchError};

/// Lists the videos directly inside `input_dir` (no recursion), sorted by path.
///
/// Entries which cannot be read are returned alongside the videos rather than failing the whole
/// search. A missing input directory is fatal.
pub fn enumerate_videos(input_dir: impl AsRef<Path>) -> Result<(Vec<PathBuf>, Vec<BatchError>), BatchError> {
    let input_dir = input_dir.as_ref();

    if !input_dir.is_dir() {
        return Err(BatchError::InputDirNotFound(input_dir.to_path_buf()));
    }

    let entries = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter(|dir_entry_res| match &dir_entry_res {
            Ok(dir_entry) => dir_entry.file_type().is_file() && is_video_file(dir_entry.path()),
            Err(_) => true,
        });

    let (mut video_paths, search_errors): (Vec<_>, Vec<_>) = entries.partition_map(|dir_entry_res| match dir_entry_res {
        Ok(dir_entry) => Left(dir_entry.into_path()),
        Err(e) => Right(BatchError::from(e)),
    });

    //sort is required for deterministic outputs.
    video_paths.sort();

    Ok((video_paths, search_errors))
}

pub fn is_video_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default()
        .to_lowercase();

    VIDEO_EXTENSIONS.iter().any(|&video_ext| video_ext == ext)
}
