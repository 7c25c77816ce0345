use crate::buffer::Window;

/// Where a file frame's bytes come from.
///
/// In-memory input is threaded through the same refill path as file input
/// (`&[u8]` is a `Read`), so the lexer never knows the difference.
pub enum Source<'a> {
    File(std::fs::File),
    Bytes(&'a [u8]),
}

/// A refillable byte stream feeding one window.
pub struct Stream<'a> {
    source: Source<'a>,
    eof: bool,
}

impl<'a> Stream<'a> {
    #[must_use]
    pub const fn from_file(file: std::fs::File) -> Self {
        Self {
            source: Source::File(file),
            eof: false,
        }
    }

    #[must_use]
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            source: Source::Bytes(bytes),
            eof: false,
        }
    }

    /// Whether the underlying stream has been read to its end.
    #[inline]
    #[must_use]
    pub const fn eof(&self) -> bool {
        self.eof
    }

    /// Tops `window` up from the stream, recording EOF when it hits.
    pub fn refill(&mut self, window: &mut Window) -> std::io::Result<()> {
        if self.eof {
            window.set_sentinel();
            return Ok(());
        }
        self.eof = match &mut self.source {
            Source::File(file) => window.fill_from(file)?,
            Source::Bytes(bytes) => window.fill_from(bytes)?,
        };
        Ok(())
    }
}
