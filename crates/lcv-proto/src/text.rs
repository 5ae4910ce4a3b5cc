//! Incremental UTF-8 decoding
//!
//! Network chunks can end in the middle of a multi-byte character. The
//! decoder keeps the incomplete tail and prepends it to the next chunk, so
//! decoding chunk by chunk gives the same text as decoding the whole body.

/// Stateful UTF-8 decoder for a chunked byte source
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, holding back an incomplete trailing sequence.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            start = valid_end;
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is left at end of input
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }

    /// Number of bytes held back waiting for the rest of a character
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"event: message"), "event: message");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_split_multibyte_character() {
        let bytes = "données €".as_bytes();
        // Split inside the 3-byte euro sign
        let split = bytes.len() - 1;
        let mut decoder = Utf8Decoder::new();
        let first = decoder.decode(&bytes[..split]);
        assert_eq!(first, "données ");
        assert_eq!(decoder.pending_len(), 2);
        let second = decoder.decode(&bytes[split..]);
        assert_eq!(second, "€");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "日本語 ✓ ok";
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for byte in text.as_bytes() {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, text);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_flushes_truncated_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }
}
