use crate::errors::{TapeError, TapeErrorKind};
use crate::io::{TapeReader, TapeWriter};
use crate::object::ObjectBlock;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, TapeError>;

/// The blocks of a single object tape.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObjectFile {
    /// Name of the source of this file, used for diagnostics.
    pub name: String,

    /// Amount of blank frames to be written after the last block.
    pub trailing_frame_count: usize,

    blocks: Vec<ObjectBlock>,
}

impl ObjectFile {
    /// Returns an empty object file which will be identified as `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Read the object file located at `path`. The file is closed before
    /// returning, regardless of the result.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            TapeError::new(
                TapeErrorKind::Stream,
                0,
                format!("could not open file: {}", e),
            )
        })?;

        let mut object = Self::new(path.display().to_string());
        object.read(BufReader::new(file))?;
        Ok(object)
    }

    /// Read all the blocks from `input` up until the end of the stream. On
    /// error, the blocks that were read successfully before the faulty one
    /// are kept.
    pub fn read<R: Read>(&mut self, input: R) -> Result<()> {
        let mut reader = TapeReader::new(input);

        loop {
            match ObjectBlock::decode(&mut reader) {
                Ok(block) => self.blocks.push(block),
                Err(e) if e.is_clean_end() => break,
                Err(e) => return Err(e),
            }
        }

        if self.blocks.is_empty() {
            warn!(file = %self.name, "no blocks found on tape");
        }
        info!(file = %self.name, blocks = self.blocks.len(), "read object file");
        Ok(())
    }

    /// Write all the blocks into `writer`, followed by the trailing blank
    /// frames. It stops on the first error, without undoing what was already
    /// written.
    pub fn write<W: Write>(&self, writer: &mut TapeWriter<W>) -> Result<()> {
        for object in &self.blocks {
            object.block.encode(writer)?;
        }
        writer.write_blank(self.trailing_frame_count)?;

        info!(
            file = %self.name,
            blocks = self.blocks.len(),
            trailer = self.trailing_frame_count,
            "wrote object file"
        );
        Ok(())
    }

    /// Remove the trailing run of blocks which are either end-of-tape or
    /// end-of-job markers. The trailing frame count is reset as well.
    pub fn strip_end_markers(&mut self) {
        while self
            .blocks
            .last()
            .is_some_and(|b| b.kind().is_end_marker())
        {
            self.blocks.pop();
        }
        self.trailing_frame_count = 0;
    }

    /// Push a new end-of-tape block at the end of the file.
    pub fn append_standard_end_marker(&mut self) {
        self.blocks.push(ObjectBlock::end_of_tape());
    }

    /// Set the leader of the first block. Does nothing on empty files.
    pub fn set_leading_frame_count(&mut self, count: usize) {
        if let Some(first) = self.blocks.first_mut() {
            first.block.set_leader_frame_count(count);
        }
    }

    /// Set the amount of blank frames after the last block. Does nothing on
    /// empty files.
    pub fn set_trailing_frame_count(&mut self, count: usize) {
        if !self.blocks.is_empty() {
            self.trailing_frame_count = count;
        }
    }

    /// Append an already classified block.
    pub fn push(&mut self, block: ObjectBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[ObjectBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
