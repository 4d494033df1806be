//! Per-topic approval tracking and the forward-cascade refinement protocol.
//!
//! Approval state is scoped to the part currently on screen and is reset
//! whenever that part changes. A part is complete when every declared topic
//! present in its data is approved; topics absent from the data are skipped
//! silently and never count against completeness.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::wizard::types::{PartKind, Topic};

/// Approval flags and per-topic comments for the displayed part.
#[derive(Debug, Default, Clone)]
pub struct ApprovalState {
    approved: HashSet<String>,
    comments: HashMap<String, String>,
}

impl ApprovalState {
    /// Clear all approvals and comments. Called whenever the displayed part
    /// changes.
    pub fn reset(&mut self) {
        self.approved.clear();
        self.comments.clear();
    }

    pub fn is_approved(&self, key: &str) -> bool {
        self.approved.contains(key)
    }

    /// Toggle approval of a topic. Returns true only on the false→true
    /// transition, which is what triggers cascade refinement.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.approved.remove(key) {
            false
        } else {
            self.approved.insert(key.to_string());
            true
        }
    }

    /// Approve every declared topic present in the data. Bulk action: does
    /// not trigger refinement.
    pub fn approve_all(&mut self, kind: PartKind, data: &Map<String, Value>) {
        for topic in kind.topics() {
            if data.contains_key(topic.key) {
                self.approved.insert(topic.key.to_string());
            }
        }
    }

    pub fn set_comment(&mut self, key: &str, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            self.comments.remove(key);
        } else {
            self.comments.insert(key.to_string(), text);
        }
    }

    pub fn comment(&self, key: &str) -> Option<&str> {
        self.comments.get(key).map(String::as_str)
    }

    /// Every topic present in the data is approved.
    pub fn is_complete(&self, kind: PartKind, data: &Map<String, Value>) -> bool {
        self.pending_topics(kind, data).is_empty()
    }

    /// Declared topics present in the data but not yet approved, in
    /// declared order.
    pub fn pending_topics(&self, kind: PartKind, data: &Map<String, Value>) -> Vec<Topic> {
        kind.topics()
            .iter()
            .filter(|t| data.contains_key(t.key) && !self.is_approved(t.key))
            .copied()
            .collect()
    }

    /// Topics strictly after `approved_key` in declared order that are
    /// still unapproved and present in the data, paired with their current
    /// values. These are the refinement targets for a cascade.
    pub fn cascade_targets(
        &self,
        kind: PartKind,
        data: &Map<String, Value>,
        approved_key: &str,
    ) -> Map<String, Value> {
        let mut targets = Map::new();
        let mut past_approved = false;
        for topic in kind.topics() {
            if topic.key == approved_key {
                past_approved = true;
                continue;
            }
            if !past_approved {
                continue;
            }
            if self.is_approved(topic.key) {
                continue;
            }
            if let Some(value) = data.get(topic.key) {
                targets.insert(topic.key.to_string(), value.clone());
            }
        }
        targets
    }
}

/// Payload for one cascade-refinement request, issued when a topic flips to
/// approved and unapproved topics remain after it.
#[derive(Debug, Clone)]
pub struct RefinementJob {
    /// Controller epoch at the moment the job was issued. The result is
    /// discarded if the epoch has moved on by the time it resolves.
    pub epoch: u64,
    pub part: PartKind,
    /// Full accumulated brand context, current part edits included.
    pub context: Value,
    pub approved_key: String,
    pub approved_value: Value,
    /// {topic → current value} for the downstream unapproved topics.
    pub targets: Map<String, Value>,
}

/// Payload for a single-topic rewrite driven by a user comment.
#[derive(Debug, Clone)]
pub struct RegenerateJob {
    pub part: PartKind,
    pub key: String,
    pub current: Value,
    pub comment: String,
}
