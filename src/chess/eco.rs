use super::error::SortError;
use std::fs;
use std::path::Path;

/// Number of leading characters of an ECO code used for table lookup.
const ECO_PREFIX_LEN: usize = 3;

/// Opening classification reference, one `"<code> <name>"` entry per line,
/// searched in file order.
#[derive(Debug, Clone, Default)]
pub struct EcoTable {
    entries: Vec<String>,
}

impl EcoTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SortError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SortError::io(path, e))?;
        Ok(Self::from_lines(text.lines()))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry starting with the code's three-character prefix, or the
    /// code itself when nothing matches.
    pub fn lookup<'a>(&'a self, code: &'a str) -> &'a str {
        let prefix = match code.char_indices().nth(ECO_PREFIX_LEN) {
            Some((end, _)) => &code[..end],
            None => code,
        };

        self.entries
            .iter()
            .find(|entry| entry.starts_with(prefix))
            .map(String::as_str)
            .unwrap_or(code)
    }
}
