use bytes::BytesMut;

/// Lines longer than this without a newline are dropped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into newline-terminated text lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line with `\n` and any `\r` before it removed.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes waiting for their newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drops the partial line if it grew past [`MAX_LINE_BYTES`].
    pub fn discard_overflow(&mut self) -> bool {
        if self.buf.len() <= MAX_LINE_BYTES {
            return false;
        }
        self.buf.clear();
        true
    }
}
