use std::sync::atomic::{AtomicU64, Ordering};

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

use crate::parser::model::{LogRecord, Severity};

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

#[derive(Debug, Default)]
pub struct FilterStats {
    pub records_scanned: AtomicU64,
    pub records_matched: AtomicU64,
}

/// Stateless display-side filter applied over a view snapshot.
///
/// Orthogonal to the pipeline's integrity guarantees: it never mutates the
/// view, only selects from it. A record must pass every configured predicate
/// (keyword, exact tag, minimum level). Records carrying an unranked severity
/// always pass a level predicate; they cannot be compared against one.
pub struct DisplayFilter {
    keyword: Option<RegexMatcher>,
    tag: Option<String>,
    min_level: Option<Severity>,
    stats: FilterStats,
}

impl DisplayFilter {
    pub fn new(
        keyword: Option<&str>,
        case_sensitive: bool,
        tag: Option<&str>,
        min_level: Option<Severity>,
    ) -> Result<Self, FilterError> {
        let keyword = match keyword {
            Some(pattern) if !pattern.is_empty() => Some(
                RegexMatcherBuilder::new()
                    .case_insensitive(!case_sensitive)
                    .multi_line(false)
                    .build(pattern)
                    .map_err(|e| FilterError::InvalidRegex(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            keyword,
            tag: tag.map(str::to_string),
            min_level,
            stats: FilterStats::default(),
        })
    }

    /// A filter that passes everything.
    pub fn pass_all() -> Self {
        Self {
            keyword: None,
            tag: None,
            min_level: None,
            stats: FilterStats::default(),
        }
    }

    #[inline]
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.stats.records_scanned.fetch_add(1, Ordering::Relaxed);

        if let Some(min) = self.min_level {
            // Unranked severities (the `A` symbol) always pass.
            if let Some(level) = record.level {
                if level < min {
                    return false;
                }
            }
        }

        if let Some(ref tag) = self.tag {
            if record.tag != *tag {
                return false;
            }
        }

        if let Some(ref matcher) = self.keyword {
            let in_message = matcher.is_match(record.message.as_bytes()).unwrap_or(false);
            let in_tag = matcher.is_match(record.tag.as_bytes()).unwrap_or(false);
            if !in_message && !in_tag {
                return false;
            }
        }

        self.stats.records_matched.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Select matching records from a snapshot, preserving order.
    pub fn apply<'a>(&self, view: &'a [LogRecord]) -> Vec<&'a LogRecord> {
        view.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn stats(&self) -> (u64, u64) {
        (
            self.stats.records_scanned.load(Ordering::Relaxed),
            self.stats.records_matched.load(Ordering::Relaxed),
        )
    }
}
