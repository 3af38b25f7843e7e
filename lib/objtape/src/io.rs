use crate::errors::{TapeError, TapeErrorKind};
use std::io::{ErrorKind, Read, Write};

type Result<T> = std::result::Result<T, TapeError>;

// Blank frames are written in chunks of this size.
const BLANK_CHUNK: usize = 512;

/// Byte reader over a tape image which keeps track of the offset being read,
/// so errors and blocks can point back to a position on the stream.
#[derive(Debug)]
pub struct TapeReader<R: Read> {
    inner: R,
    offset: usize,
}

impl<R: Read> TapeReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Returns the offset of the next byte to be read.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reads the next byte, or returns None if the end of the stream has been
    /// reached.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];

        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TapeError::new(
                        TapeErrorKind::Stream,
                        self.offset,
                        format!("could not read from tape: {}", e),
                    ))
                }
            }
        }
    }

    /// Reads the next byte inside of a block, where reaching the end of the
    /// stream is always an error.
    pub fn expect_byte(&mut self) -> Result<u8> {
        match self.next_byte()? {
            Some(b) => Ok(b),
            None => Err(TapeError::new(
                TapeErrorKind::UnexpectedEnd,
                self.offset,
                "tape ended in the middle of a block",
            )),
        }
    }
}

/// Byte writer for tape images. As with `TapeReader`, it keeps track of the
/// amount of bytes written so far.
#[derive(Debug)]
pub struct TapeWriter<W: Write> {
    inner: W,
    offset: usize,
}

impl<W: Write> TapeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(|e| {
            TapeError::new(
                TapeErrorKind::Stream,
                self.offset,
                format!("could not write to tape: {}", e),
            )
        })?;
        self.offset += bytes.len();
        Ok(())
    }

    /// Writes `count` blank frames.
    pub fn write_blank(&mut self, count: usize) -> Result<()> {
        let blank = [0u8; BLANK_CHUNK];
        let mut left = count;

        while left > 0 {
            let size = left.min(BLANK_CHUNK);
            self.write_bytes(&blank[..size])?;
            left -= size;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| {
            TapeError::new(
                TapeErrorKind::Stream,
                self.offset,
                format!("could not flush tape: {}", e),
            )
        })
    }

    /// Consumes this writer and returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
