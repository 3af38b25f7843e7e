//! Frame level encoding of the object tape format.
//!
//! Each 16-bit word travels on tape as three frames of 4, 6 and 6 bits, most
//! significant first. Inside of a frame the lower five bits of the value sit
//! on the lower five channels, whereas the sixth bit of the value is punched
//! on channel 7. Channel 6 is never used for data and channel 8 is always
//! punched. Four frame values collide with control characters of the tape
//! readers (ENQ, LF, DC1 and DC3) and are swapped with values that would
//! otherwise be invalid.

/// Marks the beginning of a normal block.
pub const START_MARKER: u8 = 0x81;

/// Leads the end-of-tape sequence.
pub const END_OF_TAPE_MARKER: u8 = 0x83;

/// Marks that there are no more words on the current block.
pub const MID_BLOCK_MARKER: u8 = 0x93;

/// Closes a block.
pub const TERMINATOR: u8 = 0xFF;

/// Channel 8, which is always punched on data frames.
pub const CHANNEL_BIT: u8 = 0x80;

/// Channels that may be punched on the first frame of a word.
pub const FIRST_FRAME_MASK: u8 = 0o017;

/// Channels that may be punched on the second and third frames of a word.
pub const FRAME_MASK: u8 = 0o137;

// Pairs of frame values which are swapped before punching them.
const REMAPPED: [(u8, u8); 4] = [(0o005, 0o174), (0o012, 0o175), (0o021, 0o176), (0o023, 0o177)];

/// Swaps the lower seven bits of the given `frame` if they are one of the
/// reserved values, leaving the channel bit untouched. The swap is its own
/// inverse, so this is used both when punching and when reading frames.
pub fn remap(frame: u8) -> u8 {
    let low = frame & 0x7F;

    for (reserved, replacement) in REMAPPED {
        if low == reserved {
            return (frame & CHANNEL_BIT) | replacement;
        }
        if low == replacement {
            return (frame & CHANNEL_BIT) | reserved;
        }
    }
    frame
}

/// Returns the frame to be punched for the given 6-bit `value`.
pub fn encode_frame(value: u8) -> u8 {
    let value = value & 0o77;
    CHANNEL_BIT | remap((value & 0o37) | ((value & 0o40) << 1))
}

/// Returns the 6-bit value held by `frame`, or None if the frame has any
/// channel punched outside of `mask` (or channel 8 is missing).
pub fn decode_frame(frame: u8, mask: u8) -> Option<u8> {
    if frame & CHANNEL_BIT == 0 {
        return None;
    }

    let low = remap(frame) & 0x7F;
    if low & !mask != 0 {
        return None;
    }
    Some((low & 0o37) | ((low & 0o100) >> 1))
}

/// Returns the three frames that represent `word`.
pub fn encode_word(word: u16) -> [u8; 3] {
    [
        encode_frame(((word >> 12) & 0o17) as u8),
        encode_frame(((word >> 6) & 0o77) as u8),
        encode_frame((word & 0o77) as u8),
    ]
}

/// Joins back the three values decoded from the frames of a word.
pub fn join_word(first: u8, second: u8, third: u8) -> u16 {
    ((first as u16 & 0o17) << 12) | ((second as u16 & 0o77) << 6) | (third as u16 & 0o77)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_is_its_own_inverse() {
        for value in 0..=0xFFu8 {
            assert_eq!(remap(remap(value)), value);
        }

        assert_eq!(remap(0o005), 0o174);
        assert_eq!(remap(0o175), 0o012);
        assert_eq!(remap(0x80 | 0o021), 0x80 | 0o176);
        assert_eq!(remap(0o023), 0o177);
        assert_eq!(remap(0o006), 0o006);
        assert_eq!(remap(0x80), 0x80);
    }

    #[test]
    fn frames_never_hold_reserved_values() {
        for value in 0..=0o77u8 {
            let frame = encode_frame(value);
            assert!(frame & CHANNEL_BIT != 0);
            assert!(![0o005, 0o012, 0o021, 0o023].contains(&(frame & 0x7F)));
            assert_ne!(frame, MID_BLOCK_MARKER);
            assert_eq!(decode_frame(frame, FRAME_MASK), Some(value));
        }
    }

    #[test]
    fn first_frame_mask() {
        assert_eq!(decode_frame(encode_frame(0o17), FIRST_FRAME_MASK), Some(0o17));
        assert_eq!(decode_frame(encode_frame(0o05), FIRST_FRAME_MASK), Some(0o05));
        assert_eq!(decode_frame(encode_frame(0o20), FIRST_FRAME_MASK), None);
        assert_eq!(decode_frame(0x90, FIRST_FRAME_MASK), None);
    }

    #[test]
    fn invalid_channels() {
        // Channel 8 missing.
        assert_eq!(decode_frame(0x01, FRAME_MASK), None);
        // Channel 6 punched.
        assert_eq!(decode_frame(0xA0, FRAME_MASK), None);
        // A literal control character with channel 8.
        assert_eq!(decode_frame(0x80 | 0o012, FRAME_MASK), None);
    }

    #[test]
    fn words() {
        assert_eq!(encode_word(0x1004), [0x81, 0x80, 0x84]);

        for word in [0x0000, 0x1004, 0x7FFF, 0x8001, 0xFFFF, 0o105214] {
            let frames = encode_word(word);
            let first = decode_frame(frames[0], FIRST_FRAME_MASK).unwrap();
            let second = decode_frame(frames[1], FRAME_MASK).unwrap();
            let third = decode_frame(frames[2], FRAME_MASK).unwrap();
            assert_eq!(join_word(first, second, third), word);
        }
    }
}
