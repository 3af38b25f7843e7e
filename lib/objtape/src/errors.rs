use std::fmt;

/// The different reasons why reading or writing a tape might fail. They are
/// roughly sorted in the order in which they can be detected.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TapeErrorKind {
    /// The stream ended while we were still skipping the leader. This is not
    /// a real error but the normal way for a tape image to end.
    CleanEnd,

    /// The stream ended in the middle of a block.
    UnexpectedEnd,

    /// Any other I/O failure from the underlying stream.
    Stream,

    /// The byte after the leader is neither the start marker nor a valid
    /// end-of-tape sequence.
    MissingStartMarker,

    /// A frame has a channel punched that is not allowed on its position.
    InvalidChannelBit,

    /// The mid-block marker showed up inside of a word.
    UnexpectedMidBlockMarker,

    /// The block terminator did not follow the mid-block marker.
    MissingTerminator,

    /// The XOR of all the words of a block is not zero.
    ChecksumMismatch,

    /// The type/subtype pair of the first word is not a known block kind.
    UnknownBlockType,

    /// A block which is not an end-of-tape marker does not carry any words.
    EmptyBlock,
}

impl fmt::Display for TapeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TapeErrorKind::CleanEnd => write!(f, "end of input"),
            TapeErrorKind::UnexpectedEnd => write!(f, "unexpected end of input"),
            TapeErrorKind::Stream => write!(f, "stream failure"),
            TapeErrorKind::MissingStartMarker => write!(f, "missing start marker"),
            TapeErrorKind::InvalidChannelBit => write!(f, "invalid channel bit"),
            TapeErrorKind::UnexpectedMidBlockMarker => write!(f, "unexpected mid-block marker"),
            TapeErrorKind::MissingTerminator => write!(f, "missing block terminator"),
            TapeErrorKind::ChecksumMismatch => write!(f, "checksum mismatch"),
            TapeErrorKind::UnknownBlockType => write!(f, "unknown block type"),
            TapeErrorKind::EmptyBlock => write!(f, "empty block"),
        }
    }
}

/// Error raised by the block codec or by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeError {
    pub kind: TapeErrorKind,

    /// Byte offset on the stream where the error was detected.
    pub offset: usize,

    pub message: String,
}

impl TapeError {
    pub fn new(kind: TapeErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            message: message.into(),
        }
    }

    /// Returns true if this is the clean end of a tape image.
    pub fn is_clean_end(&self) -> bool {
        self.kind == TapeErrorKind::CleanEnd
    }
}

impl std::error::Error for TapeError {}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} (offset {})", self.kind, self.message, self.offset)
    }
}

/// Error raised when assembling a library out of multiple object files.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// No object files were given to the assembler.
    NoInput,

    /// Reading or writing the object file named `file` failed.
    Tape { file: String, error: TapeError },
}

impl std::error::Error for LibraryError {}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LibraryError::NoInput => write!(f, "no object files were given"),
            LibraryError::Tape { file, error } => write!(f, "{}: {}", file, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_errors() {
        let err = TapeError::new(TapeErrorKind::ChecksumMismatch, 42, "residue 0o17");
        assert_eq!(err.to_string(), "checksum mismatch: residue 0o17 (offset 42)");
        assert!(!err.is_clean_end());

        let lib = LibraryError::Tape {
            file: String::from("sin.obj"),
            error: err,
        };
        assert_eq!(
            lib.to_string(),
            "sin.obj: checksum mismatch: residue 0o17 (offset 42)"
        );

        let err = TapeError::new(TapeErrorKind::InvalidChannelBit, 3, "frame 0x90");
        assert_eq!(err.to_string(), "invalid channel bit: frame 0x90 (offset 3)");
        assert_eq!(LibraryError::NoInput.to_string(), "no object files were given");
    }
}
