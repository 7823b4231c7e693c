//! Relation setup text.
//!
//! Authored relations arrive as text. A side-pair list is a comma
//! separated list of tokens such as `left-left`, `right-right%` or
//! `width`. A trailing `%` marks the relation as percent. A token with no
//! `-` is shorthand for pairing the side with itself (`width` is
//! `width-width`).
//!
//! Entry lines bind a list to a target:
//!
//! ```text
//! target=header; sidePair=left-left,width%
//! target=; sidePair=size
//! ```
//!
//! An empty target names the owner's parent.

use crate::error::{RelationError, Result};
use crate::types::RelationType;

/// One authored relation entry: a target id and its side-pair list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEntry {
    /// Target id. Empty means the owner's parent.
    pub target: String,
    pub side_pair: String,
}

impl RelationEntry {
    pub fn new(target: impl Into<String>, side_pair: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            side_pair: side_pair.into(),
        }
    }
}

/// Parse a side-pair list into `(kind, percent)` pairs.
pub fn parse_side_pairs(text: &str) -> Result<Vec<(RelationType, bool)>> {
    let mut pairs = Vec::new();
    for raw in text.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        let (token, percent) = match token.strip_suffix('%') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (token, false),
        };

        let relation = if token.contains('-') {
            RelationType::from_side_pair(token)
        } else {
            RelationType::from_side_pair(&format!("{token}-{token}"))
        };

        match relation {
            Some(relation) => pairs.push((relation, percent)),
            None => {
                return Err(RelationError::UnknownSidePair {
                    token: raw.trim().to_string(),
                })
            }
        }
    }
    Ok(pairs)
}

/// Parse entry lines of the form `target=<id>; sidePair=<list>`.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_relation_entries(text: &str) -> Result<Vec<RelationEntry>> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut target = None;
        let mut side_pair = None;
        for field in line.split(';') {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let Some((key, value)) = field.split_once('=') else {
                return Err(malformed(line));
            };
            match key.trim() {
                "target" => target = Some(value.trim().to_string()),
                "sidePair" => side_pair = Some(value.trim().to_string()),
                _ => return Err(malformed(line)),
            }
        }

        match (target, side_pair) {
            (Some(target), Some(side_pair)) => entries.push(RelationEntry { target, side_pair }),
            _ => return Err(malformed(line)),
        }
    }
    Ok(entries)
}

fn malformed(line: &str) -> RelationError {
    RelationError::MalformedEntry {
        line: line.to_string(),
    }
}
