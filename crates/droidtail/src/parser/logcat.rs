use super::model::{LogRecord, Severity};
use super::SEVERITY_SYMBOLS;

/// Parser for logcat `threadtime` lines:
///
/// `MM-DD HH:mm:ss.mmm  PID  TID LEVEL TAG: message`
///
/// A mismatch yields `None`, never an error: malformed lines and multi-line
/// stack-trace continuations are expected in the stream and are dropped by the
/// caller. Parsing is pure apart from the caller-supplied arrival key.
pub fn parse_line(line: &str, key: u64) -> Option<LogRecord> {
    let (date, rest) = take_token(line)?;
    if !is_date_token(date) {
        return None;
    }
    let (clock, rest) = take_token(rest)?;
    if !is_clock_token(clock) {
        return None;
    }

    let (pid, rest) = take_token(rest)?;
    let (tid, rest) = take_token(rest)?;
    if !is_numeric_token(pid) || !is_numeric_token(tid) {
        return None;
    }

    // One severity letter, then an optional `/` or whitespace separator.
    let rest = rest.trim_start();
    let symbol = rest.chars().next()?;
    if !SEVERITY_SYMBOLS.contains(&symbol) {
        return None;
    }
    let after_symbol = &rest[symbol.len_utf8()..];
    if !after_symbol.starts_with(['/', ':']) && !after_symbol.starts_with(char::is_whitespace) {
        // A word like "Info" is not a severity token.
        return None;
    }
    let after_sep = after_symbol.strip_prefix('/').unwrap_or(after_symbol);
    let after_sep = after_sep.trim_start();

    // Tag runs to the first `:`; the message itself may contain more colons.
    let colon = after_sep.find(':')?;
    let tag = after_sep[..colon].trim_end();
    let message = after_sep[colon + 1..].trim_start();

    Some(LogRecord {
        key,
        timestamp: format!("{date} {clock}"),
        pid: pid.to_string(),
        tid: tid.to_string(),
        level: Severity::from_symbol(symbol),
        symbol,
        tag: tag.to_string(),
        message: message.to_string(),
    })
}

/// Next whitespace-delimited token and the remainder after it.
fn take_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => Some((&s[..i], &s[i..])),
        None => Some((s, "")),
    }
}

/// `MM-DD`
fn is_date_token(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b'-'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit()
}

/// `HH:mm:ss.mmm`
fn is_clock_token(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 12 {
        return false;
    }
    for (i, &c) in b.iter().enumerate() {
        let ok = match i {
            2 | 5 => c == b':',
            8 => c == b'.',
            _ => c.is_ascii_digit(),
        };
        if !ok {
            return false;
        }
    }
    true
}

fn is_numeric_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_line() {
        let rec = parse_line("10-01 12:00:00.000 123 456 I MyTag: hello", 0).unwrap();
        assert_eq!(rec.timestamp, "10-01 12:00:00.000");
        assert_eq!(rec.pid, "123");
        assert_eq!(rec.tid, "456");
        assert_eq!(rec.level, Some(Severity::Info));
        assert_eq!(rec.symbol, 'I');
        assert_eq!(rec.tag, "MyTag");
        assert_eq!(rec.message, "hello");
    }

    #[test]
    fn test_parse_padded_columns() {
        // logcat right-aligns pid/tid with extra spaces
        let rec = parse_line("03-17 23:59:59.999   777  8888 W ActivityManager: low memory", 1)
            .unwrap();
        assert_eq!(rec.pid, "777");
        assert_eq!(rec.tid, "8888");
        assert_eq!(rec.level, Some(Severity::Warning));
        assert_eq!(rec.tag, "ActivityManager");
        assert_eq!(rec.message, "low memory");
    }

    #[test]
    fn test_message_keeps_colons() {
        let rec = parse_line("10-01 12:00:00.000 1 2 E Net: connect to 10.0.0.1:8080 failed: refused", 0)
            .unwrap();
        assert_eq!(rec.tag, "Net");
        assert_eq!(rec.message, "connect to 10.0.0.1:8080 failed: refused");
    }

    #[test]
    fn test_slash_separated_tag() {
        let rec = parse_line("10-01 12:00:00.000 1 2 D/Radio: signal lost", 0).unwrap();
        assert_eq!(rec.level, Some(Severity::Debug));
        assert_eq!(rec.tag, "Radio");
        assert_eq!(rec.message, "signal lost");
    }

    #[test]
    fn test_assert_symbol_parses_unranked() {
        let rec = parse_line("10-01 12:00:00.000 1 2 A DEBUG: native crash", 0).unwrap();
        assert_eq!(rec.level, None);
        assert_eq!(rec.symbol, 'A');
        assert_eq!(rec.tag, "DEBUG");
    }

    #[test]
    fn test_empty_tag_allowed() {
        let rec = parse_line("10-01 12:00:00.000 1 2 V : bare message", 0).unwrap();
        assert_eq!(rec.tag, "");
        assert_eq!(rec.message, "bare message");
    }

    #[test]
    fn test_garbage_yields_none() {
        assert!(parse_line("garbage", 0).is_none());
        assert!(parse_line("", 0).is_none());
        assert!(parse_line("   ", 0).is_none());
    }

    #[test]
    fn test_stack_trace_continuation_dropped() {
        assert!(parse_line("\tat com.example.App.main(App.java:15)", 0).is_none());
        assert!(parse_line("    at android.os.Looper.loop(Looper.java:193)", 0).is_none());
    }

    #[test]
    fn test_bad_timestamp_shapes() {
        assert!(parse_line("2024-10-01 12:00:00.000 1 2 I Tag: msg", 0).is_none());
        assert!(parse_line("10-01 12:00:00 1 2 I Tag: msg", 0).is_none());
        assert!(parse_line("10/01 12:00:00.000 1 2 I Tag: msg", 0).is_none());
    }

    #[test]
    fn test_non_numeric_ids_rejected() {
        assert!(parse_line("10-01 12:00:00.000 abc 456 I Tag: msg", 0).is_none());
        assert!(parse_line("10-01 12:00:00.000 123 45x I Tag: msg", 0).is_none());
    }

    #[test]
    fn test_severity_must_be_single_letter() {
        assert!(parse_line("10-01 12:00:00.000 1 2 X Tag: msg", 0).is_none());
        assert!(parse_line("10-01 12:00:00.000 1 2 Info Tag: msg", 0).is_none());
    }

    #[test]
    fn test_missing_tag_terminator_rejected() {
        assert!(parse_line("10-01 12:00:00.000 1 2 I no colon here", 0).is_none());
    }

    #[test]
    fn test_key_passthrough() {
        let rec = parse_line("10-01 12:00:00.000 1 2 I T: m", 42).unwrap();
        assert_eq!(rec.key, 42);
    }
}
