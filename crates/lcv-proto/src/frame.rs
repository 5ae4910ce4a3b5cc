//! Splitting buffered stream text into frames

/// One complete protocol frame, without its terminating blank line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Incremental splitter for blank-line delimited frames.
///
/// Feeding text in arbitrary fragments yields the same frames as feeding it
/// all at once: a frame is only emitted once its delimiter has fully
/// arrived. Each byte is scanned once; a push resumes near the end of the
/// previous one instead of rescanning a long partial frame.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
    /// Offset where the next delimiter search resumes
    scan_from: usize,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return every frame it completes, in order
    pub fn push(&mut self, fragment: &str) -> Vec<Frame> {
        self.buffer.push_str(fragment);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut from = self.scan_from;
        while let Some((idx, len)) = find_delimiter(self.buffer.as_bytes(), start, from) {
            let raw = &self.buffer[start..idx];
            // Runs of blank lines carry no frame
            if !raw.trim().is_empty() {
                frames.push(Frame::new(raw));
            }
            start = idx + len;
            from = start;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        // A newline in the last few bytes may still complete a delimiter
        self.scan_from = self.buffer.len().saturating_sub(3);
        frames
    }

    /// Text received after the last complete frame
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Drop any partial frame
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
    }
}

/// Earliest blank-line delimiter of the frame beginning at `start`, as
/// (offset, length). Matches `\n\n` and `\r\n\r\n`; the search begins at
/// `from`.
fn find_delimiter(bytes: &[u8], start: usize, from: usize) -> Option<(usize, usize)> {
    let mut pos = from.max(start);
    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'\n') {
        let nl = pos + offset;
        match bytes.get(nl + 1) {
            Some(b'\n') => return Some((nl, 2)),
            Some(b'\r')
                if nl > start && bytes[nl - 1] == b'\r' && bytes.get(nl + 2) == Some(&b'\n') =>
            {
                return Some((nl - 1, 4));
            }
            _ => {}
        }
        pos = nl + 1;
    }
    None
}
