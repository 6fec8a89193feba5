use regex::Regex;
use std::sync::LazyLock;

/// `[Key "Value"]` header line. Anchored at the start only, so trailing
/// noise after the closing bracket still matches.
pub(crate) static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[(\w+)\s+"(.+)"\]"#).expect("header pattern is valid")
});

/// Tags whose full source line is kept instead of the bare value.
const STANDARD_PRESERVED_TAGS: &[&str] = &[
    // Event
    "event", "eventdate", "eventsponsor", "eventtype", "eventrounds", "eventcountry",
    "eventcategory",
    // Location and time
    "site", "date", "time", "utctime", "utcdate",
    // White
    "white", "whiteelo", "whitetitle", "whiteuscf", "whitena", "whitetype", "whiteteam",
    "whiteteamcountry", "whiteacpl", "whitefideid", "whiteratingdiff", "whiterd", "whiterating",
    // Black
    "black", "blackelo", "blacktitle", "blackuscf", "blackna", "blacktype", "blackteam",
    "blackteamcountry", "blackacpl", "blackfideid", "blackratingdiff", "blackrd", "blackrating",
    // Classification
    "round", "result", "eco", "nic", "opening", "variation", "subvariation",
    // Setup and control
    "timecontrol", "setup", "fen", "termination", "variant", "mode",
    // Annotation
    "annotator", "beauty", "plycount", "sourcequality",
    // Tournament placement
    "section", "stage", "board", "table",
    // Source
    "source", "sourcetitle", "sourcedate", "sourceversion", "sourceversiondate",
    // Clock
    "clock", "increment", "timeseal", "rated", "promotion",
    "whitestatus", "blackstatus", "whiteactive", "blackactive",
    "tournamenttype", "tournamentname", "tournamentdate", "tournamentrounds",
    "gametype", "gamevariant", "gamephase", "gameresult", "gameduration",
    "whitetime", "blacktime", "whiteclock", "blackclock",
    "averageelo", "ratingtype", "ratingcategory",
    "platform", "platformversion", "interface",
    "metadata", "notation", "starttime", "endtime", "timezone",
    "accuracy", "complexity", "evaluation", "quality",
    "broadcast", "broadcaster", "broadcasturl",
    "competition", "competitiondate", "competitiontype",
    "whiteteamrating", "blackteamrating", "whitenationality", "blacknationality",
    "context", "continuation", "prerequisite",
    "protocol", "port", "room", "sessionid", "gameid",
];

/// Tag names (case-insensitive) re-emitted as their verbatim source line.
#[derive(Debug, Clone)]
pub struct PreserveSet {
    keys: Vec<String>,
}

impl PreserveSet {
    pub fn standard() -> Self {
        Self::from_keys(STANDARD_PRESERVED_TAGS.iter().copied())
    }

    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut keys: Vec<String> = keys.into_iter().map(|k| k.to_ascii_lowercase()).collect();
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        let lowered = key.to_ascii_lowercase();
        self.keys.binary_search(&lowered).is_ok()
    }

}

impl Default for PreserveSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// One game: ordered header tags plus opaque move-text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    tags: Vec<(String, String)>,
    moves: Vec<String>,
}

impl GameRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tag. A repeated key (any case) overwrites the value in place
    /// and keeps the spelling it was first seen with.
    pub fn set_tag(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .tags
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
        {
            Some((_, slot)) => *slot = value,
            None => self.tags.push((key.to_string(), value)),
        }
    }

    /// Stored value, which for preserved tags is the whole source line.
    pub fn raw_tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Bare tag value with any `[Key "..."]` wrapper removed.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        let raw = self.raw_tag(key)?;
        match HEADER_LINE.captures(raw).and_then(|caps| caps.get(2)) {
            Some(inner) => Some(inner.as_str()),
            None => Some(raw),
        }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.raw_tag(key).is_some()
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn push_move(&mut self, line: impl Into<String>) {
        self.moves.push(line.into());
    }

    pub(crate) fn attach_moves(&mut self, moves: Vec<String>) {
        self.moves.extend(moves);
    }

    /// A game with no move text is incomplete and never filed.
    pub fn is_complete(&self) -> bool {
        !self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_tag_case_insensitive_overwrite_keeps_position() {
        let mut game = GameRecord::new();
        game.set_tag("Event", "first");
        game.set_tag("Site", "here");
        game.set_tag("EVENT", "second");

        let tags: Vec<_> = game.tags().collect();
        assert_eq!(tags, vec![("Event", "second"), ("Site", "here")]);
    }

    #[test]
    fn test_tag_lookup_ignores_case() {
        let mut game = GameRecord::new();
        game.set_tag("WhiteElo", "2500");
        assert_eq!(game.raw_tag("whiteelo"), Some("2500"));
        assert!(game.has_tag("WHITEELO"));
        assert!(!game.has_tag("BlackElo"));
    }

    #[test]
    fn test_tag_value_unwraps_preserved_line() {
        let mut game = GameRecord::new();
        game.set_tag("Event", r#"[Event "Hastings 1895"]"#);
        game.set_tag("Custom", "plain");

        assert_eq!(game.tag_value("event"), Some("Hastings 1895"));
        assert_eq!(game.tag_value("Custom"), Some("plain"));
        assert_eq!(game.tag_value("Missing"), None);
    }

    #[test]
    fn test_completeness_follows_moves() {
        let mut game = GameRecord::new();
        game.set_tag("Event", "x");
        assert!(!game.is_complete());
        game.push_move("1. e4 e5");
        assert!(game.is_complete());
    }

    #[test]
    fn test_preserve_set_membership() {
        let set = PreserveSet::standard();
        assert!(set.contains("Event"));
        assert!(set.contains("ECO"));
        assert!(set.contains("whitefideid"));
        assert!(!set.contains("Moves"));
        assert!(!set.contains("LichessURL"));

        let custom = PreserveSet::from_keys(["Foo", "foo", "Bar"]);
        assert!(custom.contains("FOO"));
        assert!(custom.contains("bar"));
        assert!(!custom.contains("Event"));
    }
}
