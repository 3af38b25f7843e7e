use crate::block::Block;
use crate::errors::{TapeError, TapeErrorKind};
use crate::io::TapeReader;
use std::fmt;
use std::io::Read;

/// Semantic kinds of the blocks found on object tapes.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum BlockKind {
    EndOfProgram,
    SetLoadAddress,
    SetBaseSector,
    EndOfJob,
    DesectorizingMode,
    SectorizedMode,
    ReserveCommon,
    AbsoluteWords,
    RelocatableWords,
    SubprogramName,
    SubprogramEntry,
    SubprogramCall,
    ExternalReference,
    ExternalReferenceOffset,
    ChainLinkage,
    LiteralPool,
    SymbolDefinitions,
    CommonDefinition,
    DebugLineNumbers,
    DebugLocalSymbols,
    Comment,
    EndOfTape,
}

impl BlockKind {
    /// Returns true for the kinds that close a tape: end-of-tape markers and
    /// end-of-job special actions.
    pub fn is_end_marker(&self) -> bool {
        matches!(self, BlockKind::EndOfTape | BlockKind::EndOfJob)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockKind::EndOfProgram => write!(f, "special action: end of program"),
            BlockKind::SetLoadAddress => write!(f, "special action: set load address"),
            BlockKind::SetBaseSector => write!(f, "special action: set base sector"),
            BlockKind::EndOfJob => write!(f, "special action: end of job"),
            BlockKind::DesectorizingMode => {
                write!(f, "special action: desectorizing load mode")
            }
            BlockKind::SectorizedMode => write!(f, "special action: sectorized load mode"),
            BlockKind::ReserveCommon => write!(f, "special action: reserve common"),
            BlockKind::AbsoluteWords => write!(f, "absolute program words"),
            BlockKind::RelocatableWords => write!(f, "relocatable program words"),
            BlockKind::SubprogramName => write!(f, "subprogram name"),
            BlockKind::SubprogramEntry => write!(f, "subprogram entry point"),
            BlockKind::SubprogramCall => write!(f, "subprogram call"),
            BlockKind::ExternalReference => write!(f, "external reference"),
            BlockKind::ExternalReferenceOffset => write!(f, "external reference with offset"),
            BlockKind::ChainLinkage => write!(f, "chain linkage words"),
            BlockKind::LiteralPool => write!(f, "literal pool words"),
            BlockKind::SymbolDefinitions => write!(f, "symbol definitions"),
            BlockKind::CommonDefinition => write!(f, "common block definition"),
            BlockKind::DebugLineNumbers => write!(f, "debug: line numbers"),
            BlockKind::DebugLocalSymbols => write!(f, "debug: local symbols"),
            BlockKind::Comment => write!(f, "comment text"),
            BlockKind::EndOfTape => write!(f, "end of tape"),
        }
    }
}

/// An entry of the classification table. A `subtype` set to None matches any
/// subtype for the given `block_type`.
#[derive(Debug)]
pub struct KindEntry {
    pub block_type: u8,
    pub subtype: Option<u8>,
    pub kind: BlockKind,
}

const fn entry(block_type: u8, subtype: Option<u8>, kind: BlockKind) -> KindEntry {
    KindEntry {
        block_type,
        subtype,
        kind,
    }
}

/// Table of known block kinds. It is always scanned in full and the last
/// matching entry wins, so the order of the entries matters: a wildcard entry
/// can be refined by a later entry for the same type (e.g. external
/// references).
pub static BLOCK_KINDS: [KindEntry; 21] = [
    entry(0, Some(0), BlockKind::EndOfProgram),
    entry(0, Some(1), BlockKind::SetLoadAddress),
    entry(0, Some(2), BlockKind::SetBaseSector),
    entry(0, Some(3), BlockKind::EndOfJob),
    entry(0, Some(4), BlockKind::DesectorizingMode),
    entry(0, Some(5), BlockKind::SectorizedMode),
    entry(0, Some(6), BlockKind::ReserveCommon),
    entry(1, None, BlockKind::AbsoluteWords),
    entry(2, None, BlockKind::RelocatableWords),
    entry(3, Some(0), BlockKind::SubprogramName),
    entry(3, Some(1), BlockKind::SubprogramEntry),
    entry(3, Some(2), BlockKind::SubprogramCall),
    entry(4, None, BlockKind::ExternalReference),
    entry(4, Some(1), BlockKind::ExternalReferenceOffset),
    entry(5, None, BlockKind::ChainLinkage),
    entry(6, None, BlockKind::LiteralPool),
    entry(7, None, BlockKind::SymbolDefinitions),
    entry(8, None, BlockKind::CommonDefinition),
    entry(9, Some(0), BlockKind::DebugLineNumbers),
    entry(9, Some(1), BlockKind::DebugLocalSymbols),
    entry(0o17, None, BlockKind::Comment),
];

/// Returns the type and the subtype encoded in the given first word of a
/// block.
pub fn split_type(word: u16) -> (u8, u8) {
    (((word >> 12) & 0o17) as u8, ((word >> 6) & 0o77) as u8)
}

/// Returns the kind for the given `block_type` and `subtype`, if known.
pub fn lookup_kind(block_type: u8, subtype: u8) -> Option<BlockKind> {
    BLOCK_KINDS
        .iter()
        .filter(|e| e.block_type == block_type && e.subtype.map_or(true, |s| s == subtype))
        .last()
        .map(|e| e.kind)
}

/// The result of classifying a block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Classification {
    /// Bits 15-12 of the first word. Zero for end-of-tape blocks.
    pub block_type: u8,

    /// Bits 11-6 of the first word. Zero for end-of-tape blocks.
    pub subtype: u8,

    pub kind: BlockKind,
}

impl Classification {
    /// Classify the given `block`, which must have been successfully decoded
    /// (or built by hand).
    pub fn of(block: &Block) -> Result<Self, TapeError> {
        if block.is_end_of_tape {
            return Ok(Self {
                block_type: 0,
                subtype: 0,
                kind: BlockKind::EndOfTape,
            });
        }

        let Some(first) = block.words.first() else {
            return Err(TapeError::new(
                TapeErrorKind::EmptyBlock,
                block.stream_position,
                "block does not carry any words",
            ));
        };

        let (block_type, subtype) = split_type(*first);
        match lookup_kind(block_type, subtype) {
            Some(kind) => Ok(Self {
                block_type,
                subtype,
                kind,
            }),
            None => Err(TapeError::new(
                TapeErrorKind::UnknownBlockType,
                block.stream_position,
                format!("type {:o} with subtype {:02o}", block_type, subtype),
            )),
        }
    }
}

/// A block decoded from an object tape, together with its classification.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ObjectBlock {
    pub block: Block,
    pub classification: Classification,
}

impl ObjectBlock {
    /// Classify the given `block`.
    pub fn new(block: Block) -> Result<Self, TapeError> {
        let classification = Classification::of(&block)?;
        Ok(Self {
            block,
            classification,
        })
    }

    /// Returns a new end-of-tape object block.
    pub fn end_of_tape() -> Self {
        Self {
            block: Block::end_of_tape(),
            classification: Classification {
                block_type: 0,
                subtype: 0,
                kind: BlockKind::EndOfTape,
            },
        }
    }

    /// Decode and classify the next block from `reader`.
    pub fn decode<R: Read>(reader: &mut TapeReader<R>) -> Result<Self, TapeError> {
        Self::new(Block::decode(reader)?)
    }

    pub fn kind(&self) -> BlockKind {
        self.classification.kind
    }
}
