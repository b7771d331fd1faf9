use std::collections::HashMap;
use std::sync::Arc;

/// A response counts as given once it has non-whitespace content.
pub(crate) fn is_answered(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Learner responses keyed by question id.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnswerStore {
    entries: HashMap<String, String>,
}

/// Frozen copy of the store handed to the scorer.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnswerSnapshot {
    entries: Arc<HashMap<String, String>>,
}

impl AnswerStore {
    pub(crate) fn set(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(question_id.into(), value.into());
    }

    pub(crate) fn get(&self, question_id: &str) -> Option<&str> {
        self.entries.get(question_id).map(String::as_str)
    }

    pub(crate) fn answered_count(&self) -> usize {
        self.entries.values().filter(|value| is_answered(value)).count()
    }

    pub(crate) fn snapshot(&self) -> AnswerSnapshot {
        AnswerSnapshot { entries: Arc::new(self.entries.clone()) }
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
    }
}

impl AnswerSnapshot {
    pub(crate) fn get(&self, question_id: &str) -> Option<&str> {
        self.entries.get(question_id).map(String::as_str)
    }

    /// The stored response when it counts as answered.
    pub(crate) fn response(&self, question_id: &str) -> Option<&str> {
        self.get(question_id).filter(|value| is_answered(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_previous_value() {
        let mut store = AnswerStore::default();
        store.set("q1", "A");
        store.set("q1", "C");
        assert_eq!(store.get("q1"), Some("C"));
        assert_eq!(store.get("q2"), None);
    }

    #[test]
    fn empty_values_do_not_count_as_answered() {
        let mut store = AnswerStore::default();
        store.set("q1", "B");
        store.set("q2", "");
        store.set("q3", "   ");
        assert_eq!(store.answered_count(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let mut store = AnswerStore::default();
        store.set("q1", "true");
        let snapshot = store.snapshot();

        store.set("q1", "false");
        store.reset();

        assert_eq!(snapshot.get("q1"), Some("true"));
        assert_eq!(store.answered_count(), 0);
        assert_eq!(store.get("q1"), None);
    }

    #[test]
    fn snapshot_response_skips_blank_entries() {
        let mut store = AnswerStore::default();
        store.set("q1", " ");
        store.set("q2", "Paris");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("q1"), Some(" "));
        assert_eq!(snapshot.response("q1"), None);
        assert_eq!(snapshot.response("q2"), Some("Paris"));
    }
}
