//! Reading and writing of relocatable object paper tapes, and assembly of
//! several of them into a single library tape.

pub mod block;
pub mod config;
pub mod errors;
pub mod file;
pub mod frame;
pub mod io;
pub mod library;
pub mod object;

pub use block::Block;
pub use config::{parse_policy, LibraryPolicy};
pub use errors::{LibraryError, TapeError, TapeErrorKind};
pub use file::ObjectFile;
pub use library::Library;
pub use object::{BlockKind, Classification, ObjectBlock};
