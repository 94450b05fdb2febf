//! Revision tracking (colored-page drafts).

use crate::block::RevisionId;
use crate::id::BlockId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub label: String,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Blocks touched while this revision was open
    #[serde(default)]
    pub blocks: BTreeSet<BlockId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMarks {
    #[serde(default)]
    revisions: Vec<Revision>,
}

impl RevisionMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a revision, closing any revision still open.
    pub fn open(&mut self, label: impl Into<String>) -> RevisionId {
        self.open_at(label, Utc::now())
    }

    pub fn open_at(&mut self, label: impl Into<String>, at: DateTime<Utc>) -> RevisionId {
        self.close_at(at);
        let id = RevisionId(self.revisions.len() as u32 + 1);
        self.revisions.push(Revision {
            id,
            label: label.into(),
            opened_at: at,
            closed_at: None,
            blocks: BTreeSet::new(),
        });
        id
    }

    /// Close the open revision, if any
    pub fn close(&mut self) -> Option<RevisionId> {
        self.close_at(Utc::now())
    }

    pub fn close_at(&mut self, at: DateTime<Utc>) -> Option<RevisionId> {
        let revision = self.revisions.last_mut().filter(|r| r.closed_at.is_none())?;
        revision.closed_at = Some(at);
        Some(revision.id)
    }

    pub fn current(&self) -> Option<RevisionId> {
        self.revisions
            .last()
            .filter(|r| r.closed_at.is_none())
            .map(|r| r.id)
    }

    /// Note that `block` changed under the open revision.
    pub fn record(&mut self, block: BlockId) {
        if let Some(revision) = self.revisions.last_mut().filter(|r| r.closed_at.is_none()) {
            revision.blocks.insert(block);
        }
    }

    pub fn get(&self, id: RevisionId) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.iter()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_closes_previous() {
        let mut marks = RevisionMarks::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap();

        let blue = marks.open_at("Blue", t0);
        marks.record(BlockId(4));
        let pink = marks.open_at("Pink", t1);

        assert_eq!(marks.current(), Some(pink));
        assert_eq!(marks.get(blue).unwrap().closed_at, Some(t1));
        assert!(marks.get(blue).unwrap().blocks.contains(&BlockId(4)));
    }

    #[test]
    fn test_record_without_open_revision_is_ignored() {
        let mut marks = RevisionMarks::new();
        marks.record(BlockId(1));
        assert!(marks.is_empty());

        marks.open("White");
        assert!(marks.close().is_some());
        marks.record(BlockId(1));
        assert!(marks.iter().all(|r| r.blocks.is_empty()));
        assert_eq!(marks.current(), None);
    }
}
