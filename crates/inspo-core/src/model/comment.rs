//! Threaded comments attached to a project item.
//!
//! A forest is a plain `Vec<Comment>`; every comment owns its replies. The
//! edit operations are pure: they take the forest by value and hand it back,
//! moving untouched subtrees rather than copying them. An operation whose
//! target id is absent returns its input unchanged. That is the normal
//! outcome when another client removed the comment first, so it is never an
//! error.

use crate::ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One comment and its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(alias = "sender")]
    pub author: String,
    pub text: String,
    #[serde(with = "crate::model::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        alias = "replies",
        deserialize_with = "crate::model::timestamp::vec_or_null"
    )]
    pub children: Vec<Comment>,
}

impl Comment {
    /// Create a reply-less comment with a freshly minted id.
    #[must_use]
    pub fn new(author: impl Into<String>, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ids::comment_id(now),
            author: author.into(),
            text: text.into(),
            created_at: now,
            children: Vec::new(),
        }
    }

    /// Number of comments below this one (replies, replies to replies, ...).
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        count(&self.children)
    }
}

/// Append `reply` to the children of the comment whose id is `target_id`.
///
/// Searches depth-first, pre-order. On a miss the forest comes back as it
/// went in and `reply` is dropped.
#[must_use]
pub fn insert_reply(mut forest: Vec<Comment>, target_id: &str, reply: Comment) -> Vec<Comment> {
    let mut pending = Some(reply);
    if !insert_in(&mut forest, target_id, &mut pending) {
        tracing::debug!(target_id, "reply target not found; forest unchanged");
    }
    forest
}

fn insert_in(forest: &mut [Comment], target_id: &str, pending: &mut Option<Comment>) -> bool {
    for node in forest {
        if node.id == target_id {
            if let Some(reply) = pending.take() {
                node.children.push(reply);
            }
            return true;
        }
        if insert_in(&mut node.children, target_id, pending) {
            return true;
        }
    }
    false
}

/// Remove the comment whose id is `target_id`, along with all of its replies.
#[must_use]
pub fn remove_comment(mut forest: Vec<Comment>, target_id: &str) -> Vec<Comment> {
    if !remove_in(&mut forest, target_id) {
        tracing::debug!(target_id, "comment to remove not found; forest unchanged");
    }
    forest
}

fn remove_in(forest: &mut Vec<Comment>, target_id: &str) -> bool {
    let before = forest.len();
    forest.retain(|node| node.id != target_id);
    let mut removed = forest.len() != before;
    for node in forest.iter_mut() {
        removed |= remove_in(&mut node.children, target_id);
    }
    removed
}

/// Replace the text of the comment whose id is `target_id`.
///
/// Author, timestamp, id and replies are left as they were.
#[must_use]
pub fn edit_comment_text(
    mut forest: Vec<Comment>,
    target_id: &str,
    new_text: impl Into<String>,
) -> Vec<Comment> {
    if let Some(node) = find_mut(&mut forest, target_id) {
        node.text = new_text.into();
    } else {
        tracing::debug!(target_id, "comment to edit not found; forest unchanged");
    }
    forest
}

/// Append a new root-level comment. Roots are kept in posting order.
#[must_use]
pub fn append_root(mut forest: Vec<Comment>, comment: Comment) -> Vec<Comment> {
    forest.push(comment);
    forest
}

/// Find a comment anywhere in the forest.
#[must_use]
pub fn find<'a>(forest: &'a [Comment], target_id: &str) -> Option<&'a Comment> {
    walk(forest).map(|(_, node)| node).find(|node| node.id == target_id)
}

fn find_mut<'a>(forest: &'a mut [Comment], target_id: &str) -> Option<&'a mut Comment> {
    for node in forest {
        if node.id == target_id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, target_id) {
            return Some(found);
        }
    }
    None
}

/// Whether any comment in the forest carries `target_id`.
#[must_use]
pub fn contains(forest: &[Comment], target_id: &str) -> bool {
    find(forest, target_id).is_some()
}

/// Total number of comments in the forest, replies included.
#[must_use]
pub fn count(forest: &[Comment]) -> usize {
    walk(forest).count()
}

/// Depth-first, pre-order traversal yielding `(depth, comment)`; roots are depth 0.
#[must_use]
pub fn walk(forest: &[Comment]) -> Walk<'_> {
    Walk {
        stack: vec![(0, forest.iter())],
    }
}

/// Iterator returned by [`walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(usize, std::slice::Iter<'a, Comment>)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, siblings) = self.stack.last_mut()?;
            let depth = *depth;
            if let Some(node) = siblings.next() {
                if !node.children.is_empty() {
                    self.stack.push((depth + 1, node.children.iter()));
                }
                return Some((depth, node));
            }
            self.stack.pop();
        }
    }
}
