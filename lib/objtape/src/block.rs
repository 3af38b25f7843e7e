use crate::errors::{TapeError, TapeErrorKind};
use crate::frame::{
    decode_frame, encode_word, join_word, END_OF_TAPE_MARKER, FIRST_FRAME_MASK, FRAME_MASK,
    MID_BLOCK_MARKER, START_MARKER, TERMINATOR,
};
use crate::io::{TapeReader, TapeWriter};
use std::io::{Read, Write};
use tracing::debug;

type Result<T> = std::result::Result<T, TapeError>;

/// A physical record on tape: some leader, followed by either a block of
/// words or an end-of-tape marker.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Block {
    /// Amount of blank frames preceding the block.
    pub leader_frame_count: usize,

    /// The words carried by the block. The checksum word is not part of it:
    /// it's checked and dropped on decode, and recomputed on encode.
    pub words: Vec<u16>,

    /// Whether this block is an end-of-tape marker, in which case `words` is
    /// always empty.
    pub is_end_of_tape: bool,

    /// Offset of the start marker on the stream it was decoded from.
    pub stream_position: usize,
}

impl Block {
    /// Create a block carrying the given `words`.
    pub fn new(words: Vec<u16>) -> Self {
        Self {
            words,
            ..Default::default()
        }
    }

    /// Create an end-of-tape block without any leader.
    pub fn end_of_tape() -> Self {
        Self {
            is_end_of_tape: true,
            ..Default::default()
        }
    }

    /// Turn this block into an end-of-tape marker.
    pub fn make_end_of_tape(&mut self) {
        self.words.clear();
        self.is_end_of_tape = true;
    }

    pub fn set_leader_frame_count(&mut self, count: usize) {
        self.leader_frame_count = count;
    }

    /// Returns the checksum word for this block's payload.
    pub fn checksum(&self) -> u16 {
        checksum(&self.words)
    }

    /// Decode the next block from `reader`. If the stream ends while skipping
    /// the leader, an error of kind `TapeErrorKind::CleanEnd` is returned,
    /// which callers reading whole tapes should take as a normal ending.
    ///
    /// A block with a bad checksum is consumed entirely before returning
    /// `TapeErrorKind::ChecksumMismatch`, so the reader stays positioned on
    /// the next block.
    pub fn decode<R: Read>(reader: &mut TapeReader<R>) -> Result<Self> {
        let mut block = Block::default();

        // Leader.
        let marker = loop {
            match reader.next_byte()? {
                Some(0) => block.leader_frame_count += 1,
                Some(b) => break b,
                None => {
                    return Err(TapeError::new(
                        TapeErrorKind::CleanEnd,
                        reader.offset(),
                        "end of tape",
                    ))
                }
            }
        };
        block.stream_position = reader.offset() - 1;

        match marker {
            START_MARKER => {}
            END_OF_TAPE_MARKER | TERMINATOR => {
                expect_marker(reader, MID_BLOCK_MARKER, TapeErrorKind::MissingStartMarker)?;
                expect_marker(reader, TERMINATOR, TapeErrorKind::MissingStartMarker)?;
                block.is_end_of_tape = true;

                debug!(
                    position = block.stream_position,
                    leader = block.leader_frame_count,
                    "decoded end-of-tape block"
                );
                return Ok(block);
            }
            _ => {
                return Err(TapeError::new(
                    TapeErrorKind::MissingStartMarker,
                    block.stream_position,
                    format!("found {:#04x} after the leader", marker),
                ))
            }
        }

        // Words, up until the mid-block marker shows up.
        while let Some(word) = decode_word(reader)? {
            block.words.push(word);
        }
        expect_marker(reader, TERMINATOR, TapeErrorKind::MissingTerminator)?;

        // The checksum is only relevant once we know that the framing of the
        // block was right.
        let sum = checksum(&block.words);
        if sum != 0 {
            return Err(TapeError::new(
                TapeErrorKind::ChecksumMismatch,
                block.stream_position,
                format!("residue {:#08o}", sum),
            ));
        }
        block.words.pop();

        debug!(
            position = block.stream_position,
            leader = block.leader_frame_count,
            words = block.words.len(),
            "decoded block"
        );
        Ok(block)
    }

    /// Encode this block into `writer`, including its leader.
    pub fn encode<W: Write>(&self, writer: &mut TapeWriter<W>) -> Result<()> {
        writer.write_blank(self.leader_frame_count)?;

        if self.is_end_of_tape {
            debug!(position = writer.offset(), "encoding end-of-tape block");
            return writer.write_bytes(&[END_OF_TAPE_MARKER, MID_BLOCK_MARKER, TERMINATOR]);
        }

        debug!(
            position = writer.offset(),
            words = self.words.len(),
            "encoding block"
        );

        let sum = self.checksum();
        let mut bytes = Vec::with_capacity(3 * (self.words.len() + 1) + 3);
        bytes.push(START_MARKER);
        for word in self.words.iter().chain(std::iter::once(&sum)) {
            bytes.extend_from_slice(&encode_word(*word));
        }
        bytes.push(MID_BLOCK_MARKER);
        bytes.push(TERMINATOR);

        writer.write_bytes(&bytes)
    }
}

/// Returns the XOR of all the given `words`.
pub fn checksum(words: &[u16]) -> u16 {
    words.iter().fold(0, |acc, w| acc ^ w)
}

// Read the next byte from `reader` and error out with the given `kind` if it
// is not `marker`.
fn expect_marker<R: Read>(
    reader: &mut TapeReader<R>,
    marker: u8,
    kind: TapeErrorKind,
) -> Result<()> {
    let offset = reader.offset();
    let byte = reader.expect_byte()?;

    if byte != marker {
        return Err(TapeError::new(
            kind,
            offset,
            format!("expected {:#04x} but found {:#04x}", marker, byte),
        ));
    }
    Ok(())
}

// Read a frame from `reader` which is not the first one of a word.
fn decode_inner_frame<R: Read>(reader: &mut TapeReader<R>) -> Result<u8> {
    let offset = reader.offset();
    let frame = reader.expect_byte()?;

    if frame == MID_BLOCK_MARKER {
        return Err(TapeError::new(
            TapeErrorKind::UnexpectedMidBlockMarker,
            offset,
            "found inside of a word",
        ));
    }
    decode_frame(frame, FRAME_MASK).ok_or_else(|| invalid_channel(offset, frame))
}

// Decode the next word from `reader`. Returns None when the mid-block marker
// is found instead.
fn decode_word<R: Read>(reader: &mut TapeReader<R>) -> Result<Option<u16>> {
    let offset = reader.offset();
    let frame = reader.expect_byte()?;
    if frame == MID_BLOCK_MARKER {
        return Ok(None);
    }

    let first =
        decode_frame(frame, FIRST_FRAME_MASK).ok_or_else(|| invalid_channel(offset, frame))?;
    let second = decode_inner_frame(reader)?;
    let third = decode_inner_frame(reader)?;

    Ok(Some(join_word(first, second, third)))
}

fn invalid_channel(offset: usize, frame: u8) -> TapeError {
    TapeError::new(
        TapeErrorKind::InvalidChannelBit,
        offset,
        format!("frame {:#04x}", frame),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Block> {
        let mut reader = TapeReader::new(bytes);
        Block::decode(&mut reader)
    }

    fn encode(block: &Block) -> Vec<u8> {
        let mut writer = TapeWriter::new(Vec::<u8>::new());
        block.encode(&mut writer).unwrap();
        writer.into_inner()
    }

    fn assert_error(bytes: &[u8], kind: TapeErrorKind, offset: usize) {
        let err = decode(bytes).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.offset, offset);
    }

    #[test]
    fn encode_single_word() {
        let mut block = Block::new(vec![0x1004]);
        block.set_leader_frame_count(2);

        assert_eq!(
            encode(&block),
            vec![0x00, 0x00, 0x81, 0x81, 0x80, 0x84, 0x81, 0x80, 0x84, 0x93, 0xFF]
        );
    }

    #[test]
    fn encode_end_of_tape() {
        let mut block = Block::new(vec![1, 2, 3]);
        block.make_end_of_tape();
        block.set_leader_frame_count(1);

        assert!(block.words.is_empty());
        assert_eq!(encode(&block), vec![0x00, 0x83, 0x93, 0xFF]);
    }

    #[test]
    fn decode_single_word() {
        let block =
            decode(&[0x00, 0x00, 0x00, 0x81, 0x81, 0x80, 0x84, 0x81, 0x80, 0x84, 0x93, 0xFF])
                .unwrap();

        assert_eq!(block.leader_frame_count, 3);
        assert_eq!(block.stream_position, 3);
        assert_eq!(block.words, vec![0x1004]);
        assert!(!block.is_end_of_tape);
    }

    #[test]
    fn decode_end_of_tape() {
        let block = decode(&[0x00, 0x83, 0x93, 0xFF]).unwrap();
        assert!(block.is_end_of_tape);
        assert!(block.words.is_empty());
        assert_eq!(block.leader_frame_count, 1);

        // Alternate form led by the terminator.
        let block = decode(&[0xFF, 0x93, 0xFF]).unwrap();
        assert!(block.is_end_of_tape);
        assert_eq!(block.leader_frame_count, 0);
    }

    #[test]
    fn round_trip() {
        let words: Vec<u16> = (0..64u16).map(|i| i.wrapping_mul(0o1473) ^ 0o123456).collect();
        let mut block = Block::new(words);
        block.set_leader_frame_count(30);

        let decoded = decode(&encode(&block)).unwrap();
        assert_eq!(decoded.words, block.words);
        assert_eq!(decoded.leader_frame_count, 30);
        assert!(!decoded.is_end_of_tape);

        let eot = decode(&encode(&Block::end_of_tape())).unwrap();
        assert_eq!(eot, Block::end_of_tape());
    }

    #[test]
    fn checksum_folds_to_zero() {
        for words in [vec![], vec![0xFFFF], vec![0x1004, 0x0001, 0xBEEF], vec![7; 9]] {
            let bytes = encode(&Block::new(words.clone()));

            // Start marker, one frame triplet per word plus the checksum, and
            // the closing markers.
            assert_eq!(bytes.len(), 1 + 3 * (words.len() + 1) + 2);
            assert_eq!(bytes[0], START_MARKER);
            assert_eq!(&bytes[bytes.len() - 2..], &[MID_BLOCK_MARKER, TERMINATOR]);

            let punched: Vec<u16> = bytes[1..bytes.len() - 2]
                .chunks(3)
                .map(|frames| {
                    join_word(
                        decode_frame(frames[0], FIRST_FRAME_MASK).unwrap(),
                        decode_frame(frames[1], FRAME_MASK).unwrap(),
                        decode_frame(frames[2], FRAME_MASK).unwrap(),
                    )
                })
                .collect();

            assert_eq!(&punched[..words.len()], words.as_slice());
            assert_eq!(punched.iter().fold(0u16, |acc, w| acc ^ w), 0);
        }
    }

    #[test]
    fn encode_ignores_stale_checksum() {
        // Decoding drops the checksum word, so a trailing word on `words` is
        // always treated as payload.
        let block = Block::new(vec![0x1004, 0x1004]);
        let decoded = decode(&encode(&block)).unwrap();
        assert_eq!(decoded.words, vec![0x1004, 0x1004]);
    }

    #[test]
    fn clean_end() {
        assert_error(&[], TapeErrorKind::CleanEnd, 0);
        assert_error(&[0x00, 0x00, 0x00], TapeErrorKind::CleanEnd, 3);
    }

    #[test]
    fn framing_errors() {
        assert_error(&[0x00, 0x42], TapeErrorKind::MissingStartMarker, 1);
        assert_error(&[0x83, 0xFF, 0xFF], TapeErrorKind::MissingStartMarker, 1);
        assert_error(&[0x83, 0x93, 0x93], TapeErrorKind::MissingStartMarker, 2);
        assert_error(&[0x83, 0x93], TapeErrorKind::UnexpectedEnd, 2);
        assert_error(&[0x81, 0x81, 0x80], TapeErrorKind::UnexpectedEnd, 3);
        assert_error(&[0x81, 0x81, 0x93], TapeErrorKind::UnexpectedMidBlockMarker, 2);
        assert_error(&[0x81, 0x81, 0x80, 0x93], TapeErrorKind::UnexpectedMidBlockMarker, 3);
        assert_error(&[0x81, 0x93, 0x00], TapeErrorKind::MissingTerminator, 2);
        assert_error(&[0x81, 0x93], TapeErrorKind::UnexpectedEnd, 2);
    }

    #[test]
    fn invalid_channel_bit() {
        // Channel 5 cannot be punched on the first frame.
        assert_error(
            &[0x81, 0x90, 0x80, 0x80, 0x90, 0x80, 0x80, 0x93, 0xFF],
            TapeErrorKind::InvalidChannelBit,
            1,
        );
        // Channel 8 is missing on the third frame.
        assert_error(&[0x81, 0x81, 0x80, 0x04], TapeErrorKind::InvalidChannelBit, 3);
    }

    #[test]
    fn checksum_mismatch() {
        let bytes = [
            0x81, 0x81, 0x80, 0x84, 0x81, 0x80, 0x86, 0x93, 0xFF, 0x83, 0x93, 0xFF,
        ];
        let mut reader = TapeReader::new(bytes.as_slice());

        let err = Block::decode(&mut reader).unwrap_err();
        assert_eq!(err.kind, TapeErrorKind::ChecksumMismatch);
        assert_eq!(err.offset, 0);
        assert_eq!(err.to_string(), "checksum mismatch: residue 0o000002 (offset 0)");

        // The bad block was consumed in full.
        assert!(Block::decode(&mut reader).unwrap().is_end_of_tape);
    }

    #[test]
    fn empty_payload() {
        // No words at all, not even a checksum.
        let block = decode(&[0x81, 0x93, 0xFF]).unwrap();
        assert!(block.words.is_empty());
        assert!(!block.is_end_of_tape);

        // Just the checksum.
        let block = decode(&encode(&Block::new(vec![]))).unwrap();
        assert!(block.words.is_empty());
    }
}
