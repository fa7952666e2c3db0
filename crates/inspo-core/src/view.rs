//! Derived, read-only views over the item list: text search, sort order and
//! collapsed comment previews.

use crate::model::item::ParseEnumError;
use crate::model::{Comment, ProjectItem};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::{fmt, str::FromStr};

/// Order in which items are listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
        }
    }

    fn compare(self, a: &ProjectItem, b: &ProjectItem) -> Ordering {
        let newest = || b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id));
        match self {
            Self::Newest => newest(),
            Self::Oldest => a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)),
            Self::TitleAsc => title_key(a).cmp(&title_key(b)).then_with(newest),
            Self::TitleDesc => title_key(b).cmp(&title_key(a)).then_with(newest),
        }
    }
}

fn title_key(item: &ProjectItem) -> String {
    item.title.to_lowercase()
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title-asc" | "title" | "az" => Ok(Self::TitleAsc),
            "title-desc" | "za" => Ok(Self::TitleDesc),
            _ => Err(ParseEnumError {
                expected: "sort key",
                got: s.to_string(),
            }),
        }
    }
}

/// A search string plus a sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub search: Option<String>,
    pub sort: SortKey,
}

impl ItemQuery {
    /// Whether `item` matches the search text (case-insensitive, title or description).
    #[must_use]
    pub fn matches(&self, item: &ProjectItem) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim) else {
            return true;
        };
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        item.title.to_lowercase().contains(&needle)
            || item.description.to_lowercase().contains(&needle)
    }

    /// Filter and sort without touching `items`.
    #[must_use]
    pub fn apply<'a>(&self, items: &'a [ProjectItem]) -> Vec<&'a ProjectItem> {
        let mut out: Vec<&ProjectItem> = items.iter().filter(|item| self.matches(item)).collect();
        out.sort_by(|a, b| self.sort.compare(a, b));
        out
    }
}

/// The first few root comments of a thread, plus how many roots are hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentPreview<'a> {
    pub shown: &'a [Comment],
    pub hidden: usize,
}

/// Collapse a thread to its first `limit` root comments.
#[must_use]
pub fn preview(comments: &[Comment], limit: usize) -> CommentPreview<'_> {
    let cut = comments.len().min(limit);
    CommentPreview {
        shown: &comments[..cut],
        hidden: comments.len() - cut,
    }
}
