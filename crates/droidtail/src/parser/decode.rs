/// Incremental UTF-8 decoder for a byte stream cut at arbitrary positions.
///
/// The adb pipe splits its output wherever the read happens to land,
/// including between the bytes of one multibyte character. Decoding each
/// chunk independently would turn such a character into replacement
/// characters, so the trailing incomplete sequence (at most 3 bytes) is held
/// back and prepended to the next chunk instead. Invalid bytes inside a
/// chunk are replaced, same as lossy decoding.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    carry: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, joining it with the held-back suffix of the previous
    /// one. Any incomplete sequence at the end of `chunk` is carried over to
    /// the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let owned;
        let bytes: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.extend_from_slice(chunk);
            owned = joined;
            &owned
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        // Garbage mid-chunk: replace and keep going.
                        Some(n) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[n..];
                        }
                        // Incomplete sequence at the end: hold it back.
                        None => {
                            self.carry = after.to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Discard the held-back bytes. They are never re-emitted.
    pub fn clear(&mut self) {
        self.carry.clear();
    }

    pub fn has_carry(&self) -> bool {
        !self.carry.is_empty()
    }
}
