use serde::{Deserialize, Serialize};

/// Logcat severity levels, ordered `Verbose < Debug < Info < Warning < Error < Fatal`.
///
/// The threadtime grammar also emits an `A` (assert) symbol. It is accepted by
/// the parser but has no place in this ordering, so records built from such
/// lines carry `level: None` and keep the raw symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Map a single-letter severity symbol to a ranked level.
    /// Returns `None` for `A` and for anything outside the grammar.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'V' => Some(Severity::Verbose),
            'D' => Some(Severity::Debug),
            'I' => Some(Severity::Info),
            'W' => Some(Severity::Warning),
            'E' => Some(Severity::Error),
            'F' => Some(Severity::Fatal),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Severity::Verbose => 'V',
            Severity::Debug => 'D',
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Verbose => "verbose",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

/// One parsed logcat line. Immutable once built; only ever constructed from a
/// line that matched the threadtime grammar.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Arrival index, unique within a session. Display-list identity only.
    pub key: u64,

    /// Source-provided timestamp text (`MM-DD HH:mm:ss.mmm`), never re-parsed.
    pub timestamp: String,

    /// Numeric-string process id as given by the source.
    pub pid: String,

    /// Numeric-string thread id as given by the source.
    pub tid: String,

    /// Ranked severity; `None` when the line carried the unranked `A` symbol.
    pub level: Option<Severity>,

    /// The severity letter exactly as it appeared in the line.
    pub symbol: char,

    pub tag: String,

    pub message: String,
}
