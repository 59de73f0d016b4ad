//! The ideas flat file.
//!
//! ```text
//! # Ideas
//!
//! ## Inbox
//!
//! - [ ] Try the new parser #hub @file:src/ideas/parser.rs
//!
//! ## Active
//!
//! _No active ideas_
//!
//! ## Archive
//!
//! - [x] Ship v0.1 #release
//! ```

pub mod generator;
pub mod parser;

pub use generator::{generate, IdeaLine, ARCHIVE_LIMIT};
pub use parser::{parse, parse_line, IdeasDocument, ParsedIdea};

use std::path::Path;

/// Read and parse an ideas file. A missing file is an empty document.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_document(path: &Path) -> std::io::Result<IdeasDocument> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IdeasDocument::default()),
        Err(e) => Err(e),
    }
}
