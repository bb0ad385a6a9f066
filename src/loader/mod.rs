//! Pack loading and merging (spec §4.1).
//!
//! The loader is a pure function from a list of parsed documents to a
//! canonical [`crate::graph::Graph`] plus a list of non-fatal
//! diagnostics. It never touches the filesystem — discovering YAML pack
//! files on disk is the job of the CLI/server collaborators (spec §1,
//! §6).

mod document;
mod merge;

pub use document::PackDocument;
pub use merge::load_pack;
