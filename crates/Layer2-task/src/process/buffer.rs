//! Drainable output buffer for one stream of a managed process

use orca_foundation::FilterMode;
use regex::Regex;
use std::collections::VecDeque;

/// Maximum chunks kept per stream before the oldest are dropped
const DEFAULT_MAX_CHUNKS: usize = 10_000;

/// Ordered text chunks (one per line, newline kept), append-only until drained
#[derive(Debug)]
pub struct OutputBuffer {
    chunks: VecDeque<String>,
    max_chunks: usize,
    /// Chunks evicted since the last drain
    dropped: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            chunks: VecDeque::new(),
            max_chunks: DEFAULT_MAX_CHUNKS,
            dropped: 0,
        }
    }

    pub fn with_max_chunks(mut self, max: usize) -> Self {
        self.max_chunks = max.max(1);
        self
    }

    pub fn push(&mut self, chunk: impl Into<String>) {
        if self.chunks.len() >= self.max_chunks {
            self.chunks.pop_front();
            self.dropped += 1;
        }
        self.chunks.push_back(chunk.into());
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Take buffered text, clearing what was taken.
    ///
    /// With a filter only matching lines are returned. In `Retain` mode the
    /// other lines stay buffered; in `Discard` mode they are cleared too.
    pub fn take(&mut self, filter: Option<&Regex>, mode: FilterMode) -> String {
        let mut out = String::new();
        if self.dropped > 0 {
            out.push_str(&format!("[{} earlier lines dropped]\n", self.dropped));
            self.dropped = 0;
        }

        let Some(filter) = filter else {
            out.extend(self.chunks.drain(..));
            return out;
        };

        let mut kept = VecDeque::new();
        for chunk in self.chunks.drain(..) {
            if filter.is_match(chunk.trim_end_matches(['\r', '\n'])) {
                out.push_str(&chunk);
            } else if mode == FilterMode::Retain {
                kept.push_back(chunk);
            }
        }
        self.chunks = kept;
        out
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(lines: &[&str]) -> OutputBuffer {
        let mut buf = OutputBuffer::new();
        for line in lines {
            buf.push(format!("{}\n", line));
        }
        buf
    }

    #[test]
    fn test_take_clears() {
        let mut buf = filled(&["a", "b"]);
        assert_eq!(buf.take(None, FilterMode::Retain), "a\nb\n");
        assert!(buf.is_empty());
        assert_eq!(buf.take(None, FilterMode::Retain), "");
    }

    #[test]
    fn test_filter_retain_keeps_unmatched() {
        let mut buf = filled(&["error: x", "ok", "error: y"]);
        let re = Regex::new("^error").unwrap();

        assert_eq!(buf.take(Some(&re), FilterMode::Retain), "error: x\nerror: y\n");
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.take(None, FilterMode::Retain), "ok\n");
    }

    #[test]
    fn test_filter_discard_drops_unmatched() {
        let mut buf = filled(&["error: x", "ok"]);
        let re = Regex::new("^error").unwrap();

        assert_eq!(buf.take(Some(&re), FilterMode::Discard), "error: x\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bounded() {
        let mut buf = OutputBuffer::new().with_max_chunks(2);
        buf.push("1\n");
        buf.push("2\n");
        buf.push("3\n");
        assert_eq!(buf.take(None, FilterMode::Retain), "[1 earlier lines dropped]\n2\n3\n");
    }
}
