use crate::config::LibraryPolicy;
use crate::errors::LibraryError;
use crate::file::ObjectFile;
use crate::io::TapeWriter;
use std::io::Write;
use tracing::info;

/// Joins multiple object files into a single library tape.
#[derive(Debug, Default)]
pub struct Library {
    policy: LibraryPolicy,
    files: Vec<ObjectFile>,
}

impl Library {
    pub fn new(policy: LibraryPolicy) -> Self {
        Self {
            policy,
            files: vec![],
        }
    }

    /// Add a file to the library. Files end up on tape in the same order as
    /// they were added.
    pub fn push(&mut self, file: ObjectFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[ObjectFile] {
        &self.files
    }

    /// Adjust the framing of all files: end markers are stripped, the first
    /// file gets a long leader and the rest get a short one, and only the last
    /// file gets a trailer and an end-of-tape block.
    pub fn prepare(&mut self) -> Result<(), LibraryError> {
        let count = self.files.len();
        if count == 0 {
            return Err(LibraryError::NoInput);
        }

        for (idx, file) in self.files.iter_mut().enumerate() {
            file.strip_end_markers();

            if idx == 0 {
                file.set_leading_frame_count(self.policy.long_leader);
            } else {
                file.set_leading_frame_count(self.policy.short_leader);
            }

            if idx == count - 1 {
                file.append_standard_end_marker();
                file.set_trailing_frame_count(self.policy.long_leader);
            } else {
                file.set_trailing_frame_count(0);
            }
        }

        Ok(())
    }

    /// Prepare the files and write them consecutively into `output`. The
    /// first error aborts the whole process.
    pub fn assemble<W: Write>(&mut self, output: W) -> Result<(), LibraryError> {
        self.prepare()?;

        let mut writer = TapeWriter::new(output);
        for file in &self.files {
            file.write(&mut writer).map_err(|error| LibraryError::Tape {
                file: file.name.clone(),
                error,
            })?;
        }
        writer.flush().map_err(|error| LibraryError::Tape {
            file: String::from("<output>"),
            error,
        })?;

        info!(
            files = self.files.len(),
            bytes = writer.offset(),
            "assembled library"
        );
        Ok(())
    }
}
