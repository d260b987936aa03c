//! Message Log
//!
//! Ordered, id-unique list of messages for one room. Display order is arrival
//! order, not timestamp order: server clocks skew and sub-resolution ties are
//! common, so the only ordering rule is "append what is new".

use std::collections::HashSet;

use super::message::ChatMessage;

/// Arrival-ordered messages with unique ids
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
    seen: HashSet<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message unless its id is already present
    ///
    /// Returns `true` if the message was added.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if !self.seen.insert(message.id.clone()) {
            tracing::trace!(message_id = %message.id, "Duplicate message dropped");
            return false;
        }
        self.entries.push(message);
        true
    }

    /// Merge a history snapshot
    ///
    /// History entries come first in their own order, followed by live entries
    /// the history did not contain. A message already received live keeps a
    /// single copy, at its history position. Returns the number of entries
    /// that were not present before.
    pub fn hydrate(&mut self, history: Vec<ChatMessage>) -> usize {
        let mut merged = Vec::with_capacity(history.len() + self.entries.len());
        let mut merged_ids = HashSet::with_capacity(merged.capacity());
        let mut added = 0;

        for message in history {
            if !merged_ids.insert(message.id.clone()) {
                continue;
            }
            if !self.seen.contains(&message.id) {
                added += 1;
            }
            merged.push(message);
        }

        for message in self.entries.drain(..) {
            if merged_ids.insert(message.id.clone()) {
                merged.push(message);
            }
        }

        self.entries = merged;
        self.seen = merged_ids;
        added
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            author_id: "u".to_string(),
            author_name: "U".to_string(),
            body: format!("body {}", id),
            timestamp: None,
            is_own: false,
        }
    }

    fn ids(log: &MessageLog) -> Vec<&str> {
        log.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_push_dedupes_and_keeps_arrival_order() {
        let mut log = MessageLog::new();
        for id in ["b", "a", "b", "c", "a", "c", "d"] {
            log.push(msg(id));
        }
        assert_eq!(ids(&log), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_push_reports_insertion() {
        let mut log = MessageLog::new();
        assert!(log.push(msg("a")));
        assert!(!log.push(msg("a")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_hydrate_into_empty_log() {
        let mut log = MessageLog::new();
        let added = log.hydrate(vec![msg("1"), msg("2"), msg("2"), msg("3")]);
        assert_eq!(added, 3);
        assert_eq!(ids(&log), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_live_message_during_history_load_is_not_duplicated() {
        let mut log = MessageLog::new();
        log.push(msg("3"));
        log.push(msg("4"));

        let added = log.hydrate(vec![msg("1"), msg("2"), msg("3")]);
        assert_eq!(added, 2);
        assert_eq!(ids(&log), vec!["1", "2", "3", "4"]);

        // Later echoes of hydrated ids are still rejected
        assert!(!log.push(msg("1")));
        assert!(log.push(msg("5")));
        assert_eq!(ids(&log), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_every_id_exactly_once_for_arbitrary_sequences() {
        let sequences: [&[&str]; 4] = [
            &["x", "x", "x"],
            &["1", "2", "1", "3", "2", "4"],
            &[],
            &["z", "y", "x", "y", "z"],
        ];

        for seq in sequences {
            let mut log = MessageLog::new();
            let mut expected: Vec<&str> = Vec::new();
            for id in seq {
                log.push(msg(id));
                if !expected.contains(id) {
                    expected.push(*id);
                }
            }
            assert_eq!(ids(&log), expected);
        }
    }
}
