//! Per-session queue of display-class ads awaiting an out-of-band serve.
//!
//! The tool-call search path finds display candidates it cannot render
//! inline; it queues them here and the display serve endpoint drains them
//! later. Queues live for the lifetime of the process, like protocol
//! sessions: a restart loses them and the display path falls back to
//! revenue-ordered defaults.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use uuid::Uuid;

/// One queued display candidate, with the similarity it matched at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedDisplayAd {
    pub ad_id: Uuid,
    pub similarity: f64,
}

/// Process-local display-ad queues keyed by chat session.
#[derive(Debug, Default)]
pub struct DisplayAdQueue {
    queues: Mutex<HashMap<Uuid, VecDeque<QueuedDisplayAd>>>,
}

impl DisplayAdQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entries` to the session's queue, skipping ads already
    /// queued there. Returns how many were newly queued.
    pub fn push(&self, session_id: Uuid, entries: Vec<QueuedDisplayAd>) -> usize {
        let mut queues = self
            .queues
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let queue = queues.entry(session_id).or_default();
        let existing: HashSet<Uuid> = queue.iter().map(|e| e.ad_id).collect();

        let mut added = 0;
        for entry in entries {
            if !existing.contains(&entry.ad_id) {
                queue.push_back(entry);
                added += 1;
            }
        }
        added
    }

    /// Remove and return up to `max` entries from the front of the
    /// session's queue, oldest first.
    pub fn drain(&self, session_id: Uuid, max: usize) -> Vec<QueuedDisplayAd> {
        let mut queues = self
            .queues
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(queue) = queues.get_mut(&session_id) else {
            return Vec::new();
        };
        let take = max.min(queue.len());
        let drained = queue.drain(..take).collect();
        if queue.is_empty() {
            queues.remove(&session_id);
        }
        drained
    }

    /// How many ads are queued for the session.
    #[must_use]
    pub fn queued_len(&self, session_id: Uuid) -> usize {
        let queues = self
            .queues
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        queues.get(&session_id).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(similarity: f64) -> QueuedDisplayAd {
        QueuedDisplayAd {
            ad_id: Uuid::new_v4(),
            similarity,
        }
    }

    #[test]
    fn drain_returns_entries_in_queue_order() {
        let queue = DisplayAdQueue::new();
        let session = Uuid::new_v4();
        let first = entry(0.9);
        let second = entry(0.7);
        queue.push(session, vec![first, second]);

        let drained = queue.drain(session, 10);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].ad_id, first.ad_id);
        assert_eq!(drained[1].ad_id, second.ad_id);
        assert_eq!(queue.queued_len(session), 0);
    }

    #[test]
    fn drain_respects_max_and_keeps_the_rest() {
        let queue = DisplayAdQueue::new();
        let session = Uuid::new_v4();
        queue.push(session, vec![entry(0.9), entry(0.8), entry(0.7)]);

        assert_eq!(queue.drain(session, 2).len(), 2);
        assert_eq!(queue.queued_len(session), 1);
    }

    #[test]
    fn push_skips_ads_already_queued() {
        let queue = DisplayAdQueue::new();
        let session = Uuid::new_v4();
        let repeat = entry(0.9);
        assert_eq!(queue.push(session, vec![repeat, entry(0.8)]), 2);
        assert_eq!(queue.push(session, vec![repeat, entry(0.6)]), 1);
        assert_eq!(queue.queued_len(session), 3);
    }

    #[test]
    fn sessions_are_isolated() {
        let queue = DisplayAdQueue::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        queue.push(a, vec![entry(0.9)]);

        assert!(queue.drain(b, 10).is_empty());
        assert_eq!(queue.queued_len(a), 1);
    }
}
