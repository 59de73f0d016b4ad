//! Ideas file generator, the structural inverse of the parser.
//!
//! Content is written back verbatim, tokens included, with any line break
//! folded to a space. The archive section
//! shows only the most recent entries; callers keep the full list.

use std::fmt::Write as _;

use super::parser::ParsedIdea;
use crate::model::{Idea, IdeaStatus};

/// Archived ideas rendered into the file.
pub const ARCHIVE_LIMIT: usize = 20;

/// The fields the generator needs from an idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaLine {
    pub content: String,
    pub status: IdeaStatus,
    pub done: bool,

    /// `None` for ideas that only exist locally; those sort as newest
    pub updated_at: Option<i64>,
}

impl From<&Idea> for IdeaLine {
    fn from(idea: &Idea) -> Self {
        Self {
            content: idea.content.clone(),
            status: idea.status,
            done: idea.done,
            updated_at: Some(idea.updated_at),
        }
    }
}

impl From<&ParsedIdea> for IdeaLine {
    fn from(idea: &ParsedIdea) -> Self {
        Self {
            content: idea.content.clone(),
            status: idea.status,
            done: idea.done,
            updated_at: None,
        }
    }
}

/// An idea occupies exactly one line of the file.
fn single_line(content: &str) -> String {
    content.trim().replace(['\r', '\n'], " ")
}

/// Render the complete ideas file.
#[must_use]
pub fn generate(ideas: &[IdeaLine]) -> String {
    let mut out = String::from("# Ideas\n");

    for status in IdeaStatus::ALL {
        let mut section: Vec<&IdeaLine> = ideas.iter().filter(|i| i.status == status).collect();
        let total = section.len();

        if status == IdeaStatus::Archive {
            // None (local only) first, then most recently updated
            section.sort_by_key(|i| std::cmp::Reverse(i.updated_at.unwrap_or(i64::MAX)));
            section.truncate(ARCHIVE_LIMIT);
        }

        let _ = write!(out, "\n## {}\n\n", status.heading());

        if section.is_empty() {
            let _ = writeln!(out, "_No {} ideas_", status.as_str());
            continue;
        }

        for idea in &section {
            let mark = if idea.done { 'x' } else { ' ' };
            let _ = writeln!(out, "- [{mark}] {}", single_line(&idea.content));
        }

        if total > section.len() {
            let _ = write!(
                out,
                "\n_Showing the {} most recent of {total} archived ideas_\n",
                section.len()
            );
        }
    }

    out
}
