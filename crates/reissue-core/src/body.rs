//! Binary request payloads that may or may not support rewinding.
//!
//! The executor records a seekable body's offset before the first attempt and
//! seeks back to it before every later one. A plain stream cannot be rewound, so
//! a retry that would resend it is refused instead.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

/// Anything that can be both read and repositioned.
pub trait ReadSeek: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> ReadSeek for T {}

enum Source {
    Seekable(Box<dyn ReadSeek>),
    Stream(Box<dyn Read + Send + Sync>),
}

/// Binary payload owned by a request and lent to each attempt.
pub struct BinaryBody {
    source: Source,
}

impl BinaryBody {
    /// Body backed by a reader that supports `Seek`.
    pub fn seekable<R>(reader: R) -> Self
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        Self {
            source: Source::Seekable(Box::new(reader)),
        }
    }

    /// Body backed by a forward-only stream.
    pub fn stream<R>(reader: R) -> Self
    where
        R: Read + Send + Sync + 'static,
    {
        Self {
            source: Source::Stream(Box::new(reader)),
        }
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self.source, Source::Seekable(_))
    }

    /// Current read offset (seekable bodies only).
    pub fn position(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::Current(0))
    }

    /// Move back to an offset previously returned by `position`.
    pub fn rewind_to(&mut self, offset: u64) -> io::Result<()> {
        let landed = self.seek(SeekFrom::Start(offset))?;
        if landed != offset {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("rewind to offset {} landed at {}", offset, landed),
            ));
        }
        Ok(())
    }
}

impl Read for BinaryBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Seekable(r) => r.read(buf),
            Source::Stream(r) => r.read(buf),
        }
    }
}

impl Seek for BinaryBody {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.source {
            Source::Seekable(r) => r.seek(pos),
            Source::Stream(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "body is a stream and cannot be repositioned",
            )),
        }
    }
}

impl fmt::Debug for BinaryBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryBody")
            .field("seekable", &self.is_seekable())
            .finish_non_exhaustive()
    }
}
