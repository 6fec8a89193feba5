use super::error::{ErrorAccumulator, SortError};
use super::log;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    pub directories_merged: usize,
    pub files_combined: usize,
    pub failures: ErrorAccumulator,
}

/// Collapse every group directory under `output_root` into a single
/// `<group>/<group>.pgn`. A directory that fails is reported and skipped.
pub fn merge_group_dirs(output_root: &Path) -> Result<MergeSummary, SortError> {
    let mut summary = MergeSummary::default();

    let entries = match fs::read_dir(output_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(summary),
        Err(e) => return Err(SortError::io(output_root, e)),
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        match merge_dir(&dir) {
            Ok(None | Some(0)) => {}
            Ok(Some(count)) => {
                log::info(format!("Combined {} files in '{}'", count, dir.display()));
                summary.directories_merged += 1;
                summary.files_combined += count;
            }
            Err(err) => {
                log::warn(format!("Failed to combine '{}': {}", dir.display(), err));
                summary.failures.push(&err.to_string());
            }
        }
    }

    Ok(summary)
}

/// Concatenate the `.pgn` files of one directory into `<dir name>.pgn`,
/// removing the sources. Returns the number of sources folded in, not
/// counting a combined file left by an earlier run, or `None` when the
/// directory has no games.
pub fn merge_dir(dir: &Path) -> Result<Option<usize>, SortError> {
    let Some(dir_name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(None);
    };
    let combined_path = dir.join(format!("{}.pgn", dir_name));

    let pattern = format!("{}/*.pgn", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(Result::ok).collect();
    files.sort();
    if files.is_empty() {
        return Ok(None);
    }

    let mut combined = String::new();
    for file in &files {
        let content = fs::read_to_string(file).map_err(|e| SortError::io(file, e))?;
        if !content.is_empty() {
            combined.push_str(&content);
            combined.push_str("\n\n");
        }
    }

    fs::write(&combined_path, combined.trim()).map_err(|e| SortError::io(&combined_path, e))?;

    let mut removed = 0;
    for file in files.iter().filter(|file| **file != combined_path) {
        fs::remove_file(file).map_err(|e| SortError::io(file, e))?;
        removed += 1;
    }

    Ok(Some(removed))
}
