//! Ideas file parser.
//!
//! Lines are scanned in order. A `##` heading naming Inbox, Active, or
//! Archive switches the current section; before any heading the section is
//! Inbox. Checkbox lines (`- [ ] text`, `- [x] text`) become ideas. Every
//! other line is prose and is skipped.

use serde::Serialize;

use crate::model::{IdeaDraft, IdeaStatus};

/// One checkbox line from the ideas file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdea {
    /// Text after the checkbox, tags and refs included
    pub content: String,
    pub status: IdeaStatus,
    pub done: bool,
    pub tags: Vec<String>,
    pub refs: Vec<String>,

    /// 1-based source line, for diagnostics
    pub line: usize,
}

impl ParsedIdea {
    #[must_use]
    pub fn to_draft(&self) -> IdeaDraft {
        IdeaDraft {
            content: self.content.clone(),
            status: self.status,
            done: self.done,
            tags: self.tags.clone(),
            refs: self.refs.clone(),
        }
    }
}

/// A parsed ideas file, split by section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdeasDocument {
    pub inbox: Vec<ParsedIdea>,
    pub active: Vec<ParsedIdea>,
    pub archive: Vec<ParsedIdea>,
}

impl IdeasDocument {
    /// All ideas in document order of sections.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedIdea> {
        self.inbox.iter().chain(&self.active).chain(&self.archive)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inbox.len() + self.active.len() + self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn drafts(&self) -> Vec<IdeaDraft> {
        self.iter().map(ParsedIdea::to_draft).collect()
    }

    fn push(&mut self, idea: ParsedIdea) {
        match idea.status {
            IdeaStatus::Inbox => self.inbox.push(idea),
            IdeaStatus::Active => self.active.push(idea),
            IdeaStatus::Archive => self.archive.push(idea),
        }
    }
}

/// Parse a whole ideas file.
#[must_use]
pub fn parse(text: &str) -> IdeasDocument {
    let mut doc = IdeasDocument::default();
    let mut section = IdeaStatus::Inbox;

    for (i, line) in text.lines().enumerate() {
        if let Some(status) = section_header(line) {
            section = status;
            continue;
        }
        if let Some(idea) = parse_line(line, section, i + 1) {
            doc.push(idea);
        }
    }

    doc
}

/// Recognize a `##` heading whose whole title is one of the three section
/// names, ignoring case. Any other heading is prose.
fn section_header(line: &str) -> Option<IdeaStatus> {
    let heading = line.trim().strip_prefix("##")?;
    if heading.starts_with('#') {
        return None;
    }
    let title = heading.trim();
    IdeaStatus::ALL
        .into_iter()
        .find(|status| title.eq_ignore_ascii_case(status.as_str()))
}

/// Parse a single checkbox line, or `None` if it is not one.
#[must_use]
pub fn parse_line(line: &str, status: IdeaStatus, line_no: usize) -> Option<ParsedIdea> {
    let rest = line.trim_start();
    let rest = rest.strip_prefix('-').or_else(|| rest.strip_prefix('*'))?;
    let rest = rest.trim_start().strip_prefix('[')?;

    let mut chars = rest.chars();
    let done = match chars.next()? {
        ' ' => false,
        'x' | 'X' => true,
        _ => return None,
    };
    let rest = chars.as_str().strip_prefix(']')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let content = rest.trim();
    if content.is_empty() {
        return None;
    }

    Some(ParsedIdea {
        content: content.to_string(),
        status,
        done,
        tags: extract_tags(content),
        refs: extract_refs(content),
        line: line_no,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// `#word` tokens without the hash, deduplicated in first-seen order.
#[must_use]
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for (i, _) in text.match_indices('#') {
        let word: String = text[i + 1..].chars().take_while(|c| is_word_char(*c)).collect();
        if !word.is_empty() {
            push_unique(&mut tags, word);
        }
    }
    tags
}

/// `@type:value` tokens, kept whole, deduplicated in first-seen order.
#[must_use]
pub fn extract_refs(text: &str) -> Vec<String> {
    let mut refs = Vec::new();
    for (i, _) in text.match_indices('@') {
        let after = &text[i + 1..];
        let kind_len: usize = after
            .chars()
            .take_while(|c| is_word_char(*c))
            .map(char::len_utf8)
            .sum();
        if kind_len == 0 {
            continue;
        }
        let Some(value) = after[kind_len..].strip_prefix(':') else {
            continue;
        };
        let value_len: usize = value
            .chars()
            .take_while(|c| !c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        if value_len > 0 {
            push_unique(&mut refs, text[i..i + 1 + kind_len + 1 + value_len].to_string());
        }
    }
    refs
}
