//! Input validation for CLI and API arguments.
//!
//! Idea statuses resolve in three tiers: exact match → synonym lookup →
//! error with the closest suggestion. Source paths are checked against the
//! shape their mode expects before a row is written.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::model::source::parse_github_repo;
use crate::model::SourceMode;

// ── Valid value sets ─────────────────────────────────────────

pub static VALID_IDEA_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["inbox", "active", "archive"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static IDEA_STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("todo", "inbox"),
        ("new", "inbox"),
        ("backlog", "inbox"),
        ("later", "inbox"),
        ("doing", "active"),
        ("wip", "active"),
        ("current", "active"),
        ("in_progress", "active"),
        ("done", "archive"),
        ("archived", "archive"),
        ("closed", "archive"),
        ("finished", "archive"),
    ]
    .into_iter()
    .collect()
});

/// Normalize an idea status via exact match or synonym lookup.
///
/// Returns the canonical status, or an error with the original input
/// and an optional suggestion.
pub fn normalize_idea_status(input: &str) -> Result<String, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    if VALID_IDEA_STATUSES.contains(lower.as_str()) {
        return Ok(lower);
    }

    if let Some(&canonical) = IDEA_STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(canonical.to_string());
    }

    let suggestion = find_closest_match(&lower, &VALID_IDEA_STATUSES, &IDEA_STATUS_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Check a source path against its mode.
///
/// GitHub paths must be `owner/repo`, local paths must be non-empty, and
/// links must look like an http(s) URL.
pub fn validate_source_path(mode: SourceMode, path: &str) -> Result<(), String> {
    let path = path.trim();
    if path.is_empty() {
        return Err("source path must not be empty".to_string());
    }

    match mode {
        SourceMode::Github => parse_github_repo(path)
            .map(|_| ())
            .ok_or_else(|| format!("GitHub source path must be owner/repo, got '{path}'")),
        SourceMode::Link => {
            if path.starts_with("http://") || path.starts_with("https://") {
                Ok(())
            } else {
                Err(format!("link source path must be an http(s) URL, got '{path}'"))
            }
        }
        SourceMode::LocalSync => Ok(()),
    }
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // Synonyms suggest what they map to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
