use super::eco::EcoTable;
use super::error::SortError;
use super::log;
use super::sequence::SequenceRegistry;
use super::summary::FilingSummary;
use super::types::GameRecord;
use rayon::prelude::*;
use regex::{Captures, Regex};
use smallvec::SmallVec;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::LazyLock;

const UNKNOWN: &str = "Unknown";
const PLAYER_TAGS: [&str; 2] = ["White", "Black"];

static INITIAL_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+([A-Z]\.\]?")"#).expect("initial spacing pattern is valid"));
static TAG_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+""#).expect("tag wrapper pattern is valid"));
static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 ]").expect("name filter pattern is valid"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("space run pattern is valid"));

/// How games are bucketed into output directories.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GroupingMode {
    /// `<event> <date>`
    #[default]
    Event,
    /// One directory per player, the game copied into both.
    Players,
    /// Opening name.
    Openings,
    /// ECO classification name looked up in the reference table.
    Eco,
}

impl GroupingMode {
    /// Flags are checked in ECO, players, openings order; none set means event.
    pub fn from_flags(players: bool, openings: bool, eco: bool) -> Self {
        if eco {
            Self::Eco
        } else if players {
            Self::Players
        } else if openings {
            Self::Openings
        } else {
            Self::Event
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Players => "players",
            Self::Openings => "openings",
            Self::Eco => "eco",
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written(SmallVec<[PathBuf; 2]>),
    /// No move text.
    SkippedIncomplete,
    /// The grouping mode needs a tag this record lacks.
    SkippedMissingTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Destination {
    dir: PathBuf,
    file_name: String,
}

type Destinations = SmallVec<[Destination; 2]>;

/// Strip the bracket/quote and spacing artifacts left on player names by the
/// full-line tag storage, leaving a bare display name. Idempotent.
pub fn clean_player_name(key: &str, raw: &str) -> String {
    let mut value = raw.to_string();
    if value.ends_with("\"]\"]") {
        value.pop();
    }

    let value = INITIAL_SPACING.replace_all(&value, " $1");
    let value = TAG_WRAPPER.replace_all(&value, |caps: &Captures| {
        if caps[1].eq_ignore_ascii_case(key) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    value
        .replace("\"]", "")
        .trim_matches(|c: char| c == '"' || c.is_whitespace())
        .to_string()
}

/// Keep only ASCII letters, digits and spaces; collapse space runs.
pub fn sanitize_name(name: &str) -> String {
    let kept = NON_NAME_CHARS.replace_all(name, "");
    SPACE_RUNS.replace_all(kept.trim(), " ").into_owned()
}

fn or_unknown(name: String) -> String {
    if name.is_empty() {
        UNKNOWN.to_string()
    } else {
        name
    }
}

fn sanitized_tag(record: &GameRecord, key: &str) -> String {
    or_unknown(sanitize_name(record.tag_value(key).unwrap_or(UNKNOWN)))
}

/// Player name for players/event grouping. A literal "White"/"Black" inside
/// the name itself is removed as well.
// TODO: decide whether stripping the role word from real names ("Whiteman")
// should stay; grouping by player splits those names today.
fn role_stripped_player(record: &GameRecord, key: &str) -> String {
    let name = sanitize_name(record.tag_value(key).unwrap_or(UNKNOWN));
    or_unknown(sanitize_name(&name.replace(key, "")))
}

/// ECO table names are used verbatim apart from whitespace and separators.
fn path_component(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let safe = collapsed.replace(['/', '\\'], "-");
    if safe.chars().all(|c| c == '.') {
        UNKNOWN.to_string()
    } else {
        safe
    }
}

fn matchup_file_name(white: &str, black: &str) -> String {
    format!("{} vs {}.pgn", white, black)
}

fn is_player_tag(key: &str) -> bool {
    PLAYER_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(key))
}

/// Serialize a record back to PGN text: tags, blank line, move text.
pub fn render_record(record: &GameRecord) -> String {
    let mut out = String::with_capacity(256);
    for (key, value) in record.tags() {
        if is_player_tag(key) {
            let _ = writeln!(out, "[{} \"{}\"]", key, value);
        } else {
            out.push_str(value);
            out.push('\n');
        }
    }
    out.push('\n');
    out.push_str(&record.moves().join("\n"));
    out.push('\n');
    out
}

/// Reject runs where the chosen grouping cannot apply to any record.
pub fn check_prerequisites(records: &[GameRecord], mode: GroupingMode) -> Result<(), SortError> {
    if !records.iter().any(|r| r.has_tag("White") || r.has_tag("Black")) {
        return Err(SortError::NoGames);
    }
    match mode {
        GroupingMode::Openings if !records.iter().any(|r| r.has_tag("Opening")) => {
            Err(SortError::MissingTag("Opening"))
        }
        GroupingMode::Eco if !records.iter().any(|r| r.has_tag("ECO")) => {
            Err(SortError::MissingTag("ECO"))
        }
        _ => Ok(()),
    }
}

/// Writes game records into the grouped output tree.
#[derive(Debug)]
pub struct Filer {
    output_root: PathBuf,
    mode: GroupingMode,
    eco: EcoTable,
    sequences: SequenceRegistry,
}

impl Filer {
    pub fn new(output_root: impl Into<PathBuf>, mode: GroupingMode, eco: EcoTable) -> Self {
        Self {
            output_root: output_root.into(),
            mode,
            eco,
            sequences: SequenceRegistry::new(),
        }
    }

    pub fn file_all(&self, records: Vec<GameRecord>) -> FilingSummary {
        self.file_all_with(records, || {})
    }

    /// File every record in parallel. `on_record` runs once per record,
    /// whatever its outcome. A failing record is logged and counted; the
    /// rest of the batch still runs.
    pub fn file_all_with<F>(&self, records: Vec<GameRecord>, on_record: F) -> FilingSummary
    where
        F: Fn() + Sync + Send,
    {
        records
            .into_par_iter()
            .map(|record| {
                let mut summary = FilingSummary::default();
                match self.file_record(record) {
                    Ok(outcome) => summary.record(&outcome),
                    Err(err) => {
                        log::warn(format!("Failed to file game: {}", err));
                        summary.record_failure(&err);
                    }
                }
                on_record();
                summary
            })
            .reduce(FilingSummary::default, FilingSummary::merge)
    }

    pub fn file_record(&self, mut record: GameRecord) -> Result<FileOutcome, SortError> {
        if !record.is_complete() {
            return Ok(FileOutcome::SkippedIncomplete);
        }

        for key in PLAYER_TAGS {
            if let Some(raw) = record.raw_tag(key) {
                let cleaned = clean_player_name(key, raw);
                record.set_tag(key, cleaned);
            }
        }

        let Some(destinations) = self.destinations(&record) else {
            log::info(format!(
                "Skipping game without a usable tag for {} grouping",
                self.mode.name()
            ));
            return Ok(FileOutcome::SkippedMissingTag);
        };

        let body = render_record(&record);
        let mut written = SmallVec::new();
        for dest in destinations {
            let path = self
                .sequences
                .write_new(&dest.dir, &dest.file_name, body.as_bytes())?;
            written.push(path);
        }
        Ok(FileOutcome::Written(written))
    }

    fn destinations(&self, record: &GameRecord) -> Option<Destinations> {
        let root = &self.output_root;
        let mut out = Destinations::new();

        match self.mode {
            GroupingMode::Eco => {
                let code = record.tag_value("ECO")?;
                let name = path_component(self.eco.lookup(code));
                out.push(Destination {
                    dir: root.join(name),
                    file_name: matchup_file_name(
                        &sanitized_tag(record, "White"),
                        &sanitized_tag(record, "Black"),
                    ),
                });
            }
            GroupingMode::Players => {
                let white = role_stripped_player(record, "White");
                let black = role_stripped_player(record, "Black");
                let file_name = matchup_file_name(&white, &black);
                out.push(Destination {
                    dir: root.join(&white),
                    file_name: file_name.clone(),
                });
                out.push(Destination {
                    dir: root.join(&black),
                    file_name,
                });
            }
            GroupingMode::Openings => {
                let opening = sanitize_name(record.tag_value("Opening").unwrap_or(UNKNOWN));
                if opening.is_empty() || opening == UNKNOWN {
                    return None;
                }
                out.push(Destination {
                    dir: root.join(opening),
                    file_name: matchup_file_name(
                        &sanitized_tag(record, "White"),
                        &sanitized_tag(record, "Black"),
                    ),
                });
            }
            GroupingMode::Event => {
                let dir_name = format!(
                    "{} {}",
                    sanitized_tag(record, "Event"),
                    sanitized_tag(record, "Date")
                );
                out.push(Destination {
                    dir: root.join(dir_name),
                    file_name: matchup_file_name(
                        &role_stripped_player(record, "White"),
                        &role_stripped_player(record, "Black"),
                    ),
                });
            }
        }

        Some(out)
    }
}
