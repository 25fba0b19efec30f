//! Vec-backed history store.

use super::{HistoryStore, RecordQuery, TransitionRecord};
use crate::error::HistoryError;

/// In-memory transition log.
///
/// The default store: useful for tests, demos, and entities whose history
/// does not need to outlive the process. Records are kept in insertion
/// order and sorted by `changed_at` at query time.
#[derive(Clone, Debug, Default)]
pub struct InMemoryHistory {
    records: Vec<TransitionRecord>,
}

impl InMemoryHistory {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&mut self, record: TransitionRecord) -> Result<(), HistoryError> {
        self.records.push(record);
        Ok(())
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<TransitionRecord>, HistoryError> {
        let mut matches: Vec<TransitionRecord> = self
            .records
            .iter()
            .filter(|r| r.target_id == query.target_id && r.target_type == query.target_type)
            .filter(|r| {
                query
                    .from_state
                    .as_ref()
                    .is_none_or(|s| &r.from_state == s)
            })
            .filter(|r| query.to_state.as_ref().is_none_or(|s| &r.to_state == s))
            .filter(|r| {
                query
                    .changed_after
                    .is_none_or(|instant| r.changed_at >= instant)
            })
            .cloned()
            .collect();

        matches.sort_by_key(|r| r.changed_at);
        if query.descending {
            matches.reverse();
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Scalar;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn record(id: &str, from: &str, to: &str, seconds_ago: i64) -> TransitionRecord {
        TransitionRecord {
            id: Uuid::new_v4(),
            target_id: id.to_string(),
            target_type: "ticket".to_string(),
            from_state: Scalar::from(from),
            to_state: Scalar::from(to),
            changed_at: Utc::now() - Duration::seconds(seconds_ago),
            changed_by: None,
            reason: None,
            context: None,
        }
    }

    #[test]
    fn query_filters_by_target() {
        let mut store = InMemoryHistory::new();
        store.append(record("t-1", "open", "closed", 10)).unwrap();
        store.append(record("t-2", "open", "closed", 5)).unwrap();

        let query = RecordQuery::for_target("t-1", "ticket");
        let results = store.query(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target_id, "t-1");
    }

    #[test]
    fn query_orders_chronologically() {
        let mut store = InMemoryHistory::new();
        // Appended out of order on purpose.
        store.append(record("t-1", "b", "c", 10)).unwrap();
        store.append(record("t-1", "a", "b", 20)).unwrap();

        let ascending = store.query(&RecordQuery::for_target("t-1", "ticket")).unwrap();
        assert_eq!(ascending[0].from_state, Scalar::from("a"));

        let descending = store
            .query(&RecordQuery::for_target("t-1", "ticket").newest_first())
            .unwrap();
        assert_eq!(descending[0].from_state, Scalar::from("b"));
    }

    #[test]
    fn query_filters_by_states_and_range() {
        let mut store = InMemoryHistory::new();
        store.append(record("t-1", "open", "triaged", 30)).unwrap();
        store.append(record("t-1", "triaged", "open", 20)).unwrap();
        store.append(record("t-1", "open", "closed", 10)).unwrap();

        let entering_open = store
            .query(&RecordQuery::for_target("t-1", "ticket").entering(Scalar::from("open")))
            .unwrap();
        assert_eq!(entering_open.len(), 1);

        let leaving_open = store
            .query(&RecordQuery::for_target("t-1", "ticket").leaving(Scalar::from("open")))
            .unwrap();
        assert_eq!(leaving_open.len(), 2);

        let recent = store
            .query(
                &RecordQuery::for_target("t-1", "ticket")
                    .since(Utc::now() - Duration::seconds(15)),
            )
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].to_state, Scalar::from("closed"));
    }

    #[test]
    fn limit_applies_after_ordering() {
        let mut store = InMemoryHistory::new();
        store.append(record("t-1", "a", "b", 30)).unwrap();
        store.append(record("t-1", "b", "c", 20)).unwrap();
        store.append(record("t-1", "c", "d", 10)).unwrap();

        let latest = store
            .query(&RecordQuery::for_target("t-1", "ticket").newest_first().limit(2))
            .unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].to_state, Scalar::from("d"));
    }

    #[test]
    fn default_count_matches_query() {
        let mut store = InMemoryHistory::new();
        store.append(record("t-1", "a", "b", 10)).unwrap();
        store.append(record("t-1", "b", "c", 5)).unwrap();

        let query = RecordQuery::for_target("t-1", "ticket");
        assert_eq!(store.count(&query).unwrap(), 2);
    }
}
