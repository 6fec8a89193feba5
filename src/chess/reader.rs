use super::error::SortError;
use super::log;
use super::parser::PgnParser;
use super::types::GameRecord;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

const INPUT_PATTERNS: [&str; 2] = ["*.pgn", "*.pgn.zst"];

pub type PgnInput = Box<dyn Read + Send>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, SortError> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(SortError::InvalidCompression(normalized.to_string()))
        }
    }

    /// `.zst` files are zstd streams, everything else is plain text.
    pub fn infer(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

/// Games from a batch of input files, in input order.
#[derive(Debug, Default)]
pub struct ParsedInputs {
    pub games: Vec<GameRecord>,
    pub files_read: usize,
    pub unreadable: usize,
}

/// PGN inputs (`*.pgn`, `*.pgn.zst`) directly inside `dir`, sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, SortError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let mut paths = Vec::new();
    for pattern in INPUT_PATTERNS {
        let pattern = format!("{}/{}", escaped, pattern);
        paths.extend(
            glob::glob(&pattern)?
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file()),
        );
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

pub fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<PgnInput, SortError> {
    let file = File::open(path).map_err(|e| SortError::io(path, e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| SortError::io(path, e)),
    }
}

/// Whole file as text. Bytes that are not UTF-8 are replaced, never fatal.
pub fn read_input(path: &Path, compression: CompressionMode) -> Result<String, SortError> {
    let mut input = open_input_stream(path, compression)?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| SortError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read and parse every path in parallel. `forced` overrides per-file
/// compression detection. An unreadable file is skipped with a warning,
/// unless it is the only input.
pub fn parse_inputs(
    paths: &[PathBuf],
    forced: Option<CompressionMode>,
    parser: &PgnParser,
) -> Result<ParsedInputs, SortError> {
    let per_file: Vec<Result<Vec<GameRecord>, SortError>> = paths
        .par_iter()
        .map(|path| {
            let compression = forced.unwrap_or_else(|| CompressionMode::infer(path));
            let text = read_input(path, compression)?;
            let games = parser.parse(&text);
            log::info(format!("Parsed {} games from '{}'", games.len(), path.display()));
            Ok(games)
        })
        .collect();

    let mut parsed = ParsedInputs::default();
    for result in per_file {
        match result {
            Ok(games) => {
                parsed.files_read += 1;
                parsed.games.extend(games);
            }
            Err(err) => {
                if paths.len() == 1 {
                    return Err(err);
                }
                log::warn(err.to_string());
                parsed.unreadable += 1;
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TWO_GAMES: &str = "[Event \"Test\"]\n[White \"Smith J.\"]\n[Black \"Doe A.\"]\n1. e4 e5\n\n[Event \"Test2\"]\n[White \"Lee K.\"]\n[Black \"Park S.\"]\n1. d4 d5";

    #[test]
    fn test_compression_mode_parse() {
        assert_eq!(CompressionMode::parse("zstd").unwrap(), CompressionMode::Zstd);
        assert_eq!(CompressionMode::parse(" ZSTD ").unwrap(), CompressionMode::Zstd);
        assert!(matches!(
            CompressionMode::parse("gzip"),
            Err(SortError::InvalidCompression(raw)) if raw == "gzip"
        ));
        assert!(CompressionMode::parse("").is_err());
    }

    #[test]
    fn test_compression_mode_infer() {
        assert_eq!(CompressionMode::infer(Path::new("a.pgn")), CompressionMode::Plain);
        assert_eq!(CompressionMode::infer(Path::new("a.pgn.zst")), CompressionMode::Zstd);
        assert_eq!(CompressionMode::infer(Path::new("a.PGN.ZST")), CompressionMode::Zstd);
    }

    #[test]
    fn test_discover_inputs_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.pgn"), "").unwrap();
        fs::write(tmp.path().join("a.pgn.zst"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("dir.pgn")).unwrap();

        let paths = discover_inputs(tmp.path()).unwrap();
        assert_eq!(
            paths,
            vec![tmp.path().join("a.pgn.zst"), tmp.path().join("b.pgn")]
        );
    }

    #[test]
    fn test_zstd_input_matches_plain_input() {
        let tmp = tempfile::tempdir().unwrap();
        let plain = tmp.path().join("games.pgn");
        let packed = tmp.path().join("games.pgn.zst");
        fs::write(&plain, TWO_GAMES).unwrap();
        fs::write(&packed, zstd::encode_all(TWO_GAMES.as_bytes(), 0).unwrap()).unwrap();

        let parser = PgnParser::default();
        let from_plain = parse_inputs(&[plain], None, &parser).unwrap();
        let from_packed = parse_inputs(&[packed], None, &parser).unwrap();

        assert_eq!(from_plain.games.len(), 2);
        assert_eq!(from_plain.games, from_packed.games);
    }

    #[test]
    fn test_read_input_replaces_invalid_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("latin1.pgn");
        fs::write(&path, b"[Event \"Caf\xe9\"]\n1. e4").unwrap();

        let text = read_input(&path, CompressionMode::Plain).unwrap();
        assert!(text.starts_with("[Event \"Caf"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_parse_inputs_keeps_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("1.pgn");
        let second = tmp.path().join("2.pgn");
        fs::write(&first, "[Event \"One\"]\n1. e4").unwrap();
        fs::write(&second, "[Event \"Two\"]\n1. d4\n[Event \"Three\"]\n1. c4").unwrap();

        let parsed = parse_inputs(&[first, second], None, &PgnParser::default()).unwrap();
        let events: Vec<_> = parsed
            .games
            .iter()
            .map(|g| g.tag_value("Event").unwrap())
            .collect();
        assert_eq!(events, vec!["One", "Two", "Three"]);
        assert_eq!(parsed.files_read, 2);
    }

    #[test]
    fn test_parse_inputs_skips_unreadable_when_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.pgn");
        let bad = tmp.path().join("bad.pgn.zst");
        fs::write(&good, TWO_GAMES).unwrap();
        fs::write(&bad, "not zstd at all").unwrap();

        let parser = PgnParser::default();
        let parsed = parse_inputs(&[good, bad.clone()], None, &parser).unwrap();
        assert_eq!(parsed.games.len(), 2);
        assert_eq!(parsed.unreadable, 1);

        let err = parse_inputs(&[bad], None, &parser).unwrap_err();
        assert!(err.to_string().contains("bad.pgn.zst"));
    }

    #[test]
    fn test_parse_inputs_single_missing_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.pgn");
        assert!(parse_inputs(&[missing], None, &PgnParser::default()).is_err());
    }
}
