/// Re-frames an unbounded byte stream into `\n`-terminated lines.
///
/// Bytes are only decoded once a whole line is available, so a multi-byte
/// character split across two reads is reassembled before decoding. Invalid
/// UTF-8 becomes U+FFFD instead of failing the line.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|byte| *byte == b'\n') {
            let (head, tail) = rest.split_at(pos);
            if self.pending.is_empty() {
                lines.push(String::from_utf8_lossy(head).into_owned());
            } else {
                self.pending.extend_from_slice(head);
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            }
            rest = &tail[1..];
        }
        self.pending.extend_from_slice(rest);
        lines
    }

    /// Returns the retained partial line, if any. Call once at end of stream.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::LineFramer;

    fn frame_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.feed(chunk));
        }
        lines.extend(framer.flush());
        lines
    }

    #[test]
    fn splits_multiple_lines_in_one_chunk() {
        let lines = frame_all(&[b"A\nB\nC\n".as_slice()]);
        assert_eq!(lines, vec!["A", "B", "C"]);
    }

    #[test]
    fn carries_partial_line_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"hel").is_empty());
        assert_eq!(framer.pending_len(), 3);
        assert_eq!(framer.feed(b"lo\nwor"), vec!["hello"]);
        assert_eq!(framer.feed(b"ld\n"), vec!["world"]);
        assert_eq!(framer.flush(), None);
    }

    #[test]
    fn every_split_of_the_stream_yields_the_same_lines() {
        let stream = b"first line\n\nthird \xc3\xa9t\xc3\xa9\nunterminated tail";
        let expected = vec!["first line", "", "third été", "unterminated tail"];
        for split in 0..=stream.len() {
            let (left, right) = stream.split_at(split);
            assert_eq!(frame_all(&[left, right]), expected, "split at {split}");
        }
        let single_bytes = stream.chunks(1).collect::<Vec<&[u8]>>();
        assert_eq!(frame_all(&single_bytes), expected);
    }

    #[test]
    fn multibyte_character_split_across_reads_survives() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(&[0xe2, 0x9c]).is_empty());
        assert_eq!(framer.feed(&[0x93, b'\n']), vec!["✓"]);
    }

    #[test]
    fn invalid_bytes_are_replaced_not_fatal() {
        let lines = frame_all(&[b"ok \xff\xfe bytes\nnext\n".as_slice()]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok \u{fffd}\u{fffd} bytes");
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn zero_length_feed_is_harmless() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"").is_empty());
        assert_eq!(framer.flush(), None);
    }

    #[test]
    fn flush_emits_unterminated_fragment_once() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"tail").is_empty());
        assert_eq!(framer.flush().as_deref(), Some("tail"));
        assert_eq!(framer.flush(), None);
    }
}
