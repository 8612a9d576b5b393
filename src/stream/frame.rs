// src/stream/frame.rs
//! Line framing for the streaming body: frames end at `\n` (optionally
//! preceded by `\r`), blank lines are keep-alives.

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    // Prefix of `buf` already known to hold no `\n`.
    scanned: usize,
}

impl FrameDecoder {
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete, non-blank frame; partial trailing data stays buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.scanned = self.buf.len();
                return None;
            };
            let pos = self.scanned + offset;
            self.scanned = 0;
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(line);
        }
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
