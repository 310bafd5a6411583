/// Reassembles complete lines from an unbounded stream of arbitrarily-split
/// text chunks.
///
/// Chunk boundaries from the adb pipe fall anywhere, including mid-line. The
/// reassembler holds at most one incomplete line between `ingest` calls; the
/// held text is emitted as soon as its terminating `\n` arrives, or discarded
/// on `clear()`.
#[derive(Debug, Default)]
pub struct LineReassembler {
    partial: String,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` to the held partial line and return every complete line
    /// it closes, in order. The text after the last `\n` (possibly empty)
    /// becomes the new partial line. Synchronous, O(chunk length).
    pub fn ingest(&mut self, chunk: &str) -> Vec<String> {
        self.partial.push_str(chunk);

        // No separator yet: everything stays buffered.
        if !self.partial.contains('\n') {
            return Vec::new();
        }

        let mut pieces: Vec<&str> = self.partial.split('\n').collect();
        // The piece after the final separator is the next partial line.
        let remainder = pieces.pop().unwrap_or("").to_string();
        let lines: Vec<String> = pieces.into_iter().map(str::to_string).collect();
        self.partial = remainder;
        lines
    }

    /// Discard the partial-line buffer. Buffered text is never re-emitted.
    pub fn clear(&mut self) {
        self.partial.clear();
    }

    /// Returns true if an incomplete line is currently held.
    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut r = LineReassembler::new();
        assert_eq!(r.ingest("hello\n"), vec!["hello"]);
        assert!(!r.has_partial());
    }

    #[test]
    fn test_partial_line_held_until_terminated() {
        let mut r = LineReassembler::new();
        assert!(r.ingest("hel").is_empty());
        assert!(r.has_partial());
        assert_eq!(r.ingest("lo\nwor"), vec!["hello"]);
        assert_eq!(r.ingest("ld\n"), vec!["world"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut r = LineReassembler::new();
        assert_eq!(r.ingest("a\nb\nc\n"), vec!["a", "b", "c"]);
        assert!(!r.has_partial());
    }

    #[test]
    fn test_trailing_text_becomes_partial() {
        let mut r = LineReassembler::new();
        assert_eq!(r.ingest("a\nb"), vec!["a"]);
        assert!(r.has_partial());
        assert_eq!(r.ingest("\n"), vec!["b"]);
    }

    #[test]
    fn test_empty_lines_preserved() {
        let mut r = LineReassembler::new();
        assert_eq!(r.ingest("a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_clear_discards_partial() {
        let mut r = LineReassembler::new();
        r.ingest("half a li");
        r.clear();
        assert!(!r.has_partial());
        // The discarded text must never resurface.
        assert_eq!(r.ingest("ne\ndone\n"), vec!["ne", "done"]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut r = LineReassembler::new();
        assert!(r.ingest("").is_empty());
        r.ingest("abc");
        assert!(r.ingest("").is_empty());
        assert_eq!(r.ingest("\n"), vec!["abc"]);
    }

    // Chunk-boundary property: however the input is split, the emitted lines
    // equal the substrings between separators.
    #[test]
    fn test_emitted_lines_independent_of_chunking() {
        let text = "10-01 first line\nsecond: with colon\n\nfourth\n";
        let expected: Vec<&str> = vec!["10-01 first line", "second: with colon", "", "fourth"];

        for split_at in 0..=text.len() {
            if !text.is_char_boundary(split_at) {
                continue;
            }
            let mut r = LineReassembler::new();
            let mut lines = r.ingest(&text[..split_at]);
            lines.extend(r.ingest(&text[split_at..]));
            assert_eq!(lines, expected, "split at byte {split_at}");
            assert!(!r.has_partial());
        }
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let text = "alpha\nbeta\n";
        let mut r = LineReassembler::new();
        let mut lines = Vec::new();
        for ch in text.chars() {
            lines.extend(r.ingest(&ch.to_string()));
        }
        assert_eq!(lines, vec!["alpha", "beta"]);
    }
}
