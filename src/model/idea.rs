//! Idea model.
//!
//! Ideas are short freeform notes with a workflow status. The flat-file
//! representation carries no stable identifier, so the only matching key
//! across the local/remote boundary is the normalized content.

use serde::{Deserialize, Serialize};

use crate::validate::normalize_idea_status;

/// Workflow status of an idea. Independent of the `done` checkbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    #[default]
    Inbox,
    Active,
    Archive,
}

impl IdeaStatus {
    /// All statuses in document order.
    pub const ALL: [Self; 3] = [Self::Inbox, Self::Active, Self::Archive];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Active => "active",
            Self::Archive => "archive",
        }
    }

    /// Section heading used in the ideas file.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Active => "Active",
            Self::Archive => "Archive",
        }
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdeaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_idea_status(s) {
            Ok(canonical) => match canonical.as_str() {
                "active" => Ok(Self::Active),
                "archive" => Ok(Self::Archive),
                _ => Ok(Self::Inbox),
            },
            Err((input, Some(suggestion))) => {
                Err(format!("Invalid status '{input}' (did you mean '{suggestion}'?)"))
            }
            Err((input, None)) => Err(format!("Invalid status '{input}'")),
        }
    }
}

/// A stored idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub status: IdeaStatus,
    pub done: bool,
    pub tags: Vec<String>,
    pub refs: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A normalized local idea, as parsed from the ideas file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaDraft {
    pub content: String,
    #[serde(default)]
    pub status: IdeaStatus,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// Changed fields of a stored idea. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IdeaStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<String>>,
}

impl IdeaPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.done.is_none() && self.tags.is_none() && self.refs.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_with_synonyms() {
        assert_eq!("inbox".parse::<IdeaStatus>().unwrap(), IdeaStatus::Inbox);
        assert_eq!("Active".parse::<IdeaStatus>().unwrap(), IdeaStatus::Active);
        assert_eq!("done".parse::<IdeaStatus>().unwrap(), IdeaStatus::Archive);
        assert_eq!("doing".parse::<IdeaStatus>().unwrap(), IdeaStatus::Active);
        let err = "archve".parse::<IdeaStatus>().unwrap_err();
        assert!(err.contains("archive"));
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&IdeaStatus::Archive).unwrap();
        assert_eq!(json, "\"archive\"");
        let draft: IdeaDraft = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(draft.status, IdeaStatus::Inbox);
        assert!(!draft.done);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(IdeaPatch::default().is_empty());
        assert!(!IdeaPatch { done: Some(true), ..IdeaPatch::default() }.is_empty());
    }
}
