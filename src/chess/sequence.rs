use super::error::SortError;
use regex::Regex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static NUMBERED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)_").expect("numbered name pattern is valid"));

/// Counter state for one destination directory. `highest` stays `None` until
/// the directory has been scanned for existing `NNNN_` names.
#[derive(Debug, Default)]
struct DirSlot {
    highest: Option<u32>,
}

impl DirSlot {
    /// `None` once the counter has reached `u32::MAX`.
    fn next(&mut self, dir: &Path) -> Result<Option<u32>, SortError> {
        let highest = match self.highest {
            Some(highest) => highest,
            None => highest_numbered_prefix(dir)?,
        };
        let Some(next) = highest.checked_add(1) else {
            self.highest = Some(highest);
            return Ok(None);
        };
        self.highest = Some(next);
        Ok(Some(next))
    }
}

/// Directory-scoped numbering for colliding file names.
///
/// Each directory gets its own lock, held across picking a name and creating
/// the file, so parallel writers into the same directory never reuse a number.
#[derive(Debug, Default)]
pub struct SequenceRegistry {
    slots: Mutex<HashMap<PathBuf, Arc<Mutex<DirSlot>>>>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, dir: &Path) -> Arc<Mutex<DirSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(dir.to_path_buf()).or_default())
    }

    /// Create `dir/name` with `contents`. When that name is taken, the file is
    /// written as `dir/NNNN_name` with the next unused number instead.
    /// Existing files are never touched.
    pub fn write_new(&self, dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, SortError> {
        fs::create_dir_all(dir).map_err(|e| SortError::io(dir, e))?;

        let slot = self.slot(dir);
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let plain = dir.join(name);
        match create_new(&plain, contents) {
            Ok(()) => return Ok(plain),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(SortError::io(&plain, e)),
        }

        loop {
            let Some(number) = slot.next(dir)? else {
                return Err(SortError::SequenceExhausted {
                    dir: dir.to_path_buf(),
                    name: name.to_string(),
                });
            };
            let numbered = dir.join(format!("{:04}_{}", number, name));
            match create_new(&numbered, contents) {
                Ok(()) => return Ok(numbered),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(SortError::io(&numbered, e)),
            }
        }
    }
}

fn create_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)
}

/// Highest `NNNN_` prefix among the directory's entries, 0 when there is none.
fn highest_numbered_prefix(dir: &Path) -> Result<u32, SortError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(SortError::io(dir, e)),
    };

    let mut highest = 0;
    for entry in entries {
        let entry = entry.map_err(|e| SortError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(number) = NUMBERED_NAME
            .captures(&name)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse::<u32>().ok())
        {
            highest = highest.max(number);
        }
    }
    Ok(highest)
}
