//! Append-only transition history.
//!
//! An optional capability: when a machine carries a `HistoryRecorder`, every
//! committed transition appends one immutable `TransitionRecord`, and the
//! recorder derives queries from that log — counts, last change, time spent
//! in a state, and a gap-free timeline.
//!
//! Recording is fire-and-forget. A storage failure is logged and swallowed;
//! it never turns a committed transition into a reported failure.

use crate::core::{Scalar, State, TransitionContext};
use crate::error::HistoryError;
use crate::machine::Entity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

mod memory;

pub use memory::InMemoryHistory;

/// One row of an entity's transition log.
///
/// Immutable after creation and ordered by `changed_at`; the full set of
/// records for one `(target_id, target_type)` pair is that entity's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Row identity
    pub id: Uuid,
    /// Identity of the owning entity
    pub target_id: String,
    /// Type tag of the owning entity
    pub target_type: String,
    /// Stored form of the state being left
    pub from_state: Scalar,
    /// Stored form of the state being entered
    pub to_state: Scalar,
    /// When the transition committed
    pub changed_at: DateTime<Utc>,
    /// Actor lifted from the context's `changed_by` key
    pub changed_by: Option<String>,
    /// Explanation lifted from the context's `reason` key
    pub reason: Option<String>,
    /// Remaining context keys, serialized opaquely
    pub context: Option<serde_json::Value>,
}

/// Filter and ordering parameters for history lookups.
#[derive(Clone, Debug)]
pub struct RecordQuery {
    /// Entity identity to match
    pub target_id: String,
    /// Entity type tag to match
    pub target_type: String,
    /// Match records leaving this state
    pub from_state: Option<Scalar>,
    /// Match records entering this state
    pub to_state: Option<Scalar>,
    /// Match records with `changed_at` at or after this instant
    pub changed_after: Option<DateTime<Utc>>,
    /// Most-recent-first ordering when true
    pub descending: bool,
    /// Maximum number of records, applied after ordering
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// Query for everything belonging to one entity, oldest first.
    pub fn for_target(target_id: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            target_type: target_type.into(),
            from_state: None,
            to_state: None,
            changed_after: None,
            descending: false,
            limit: None,
        }
    }

    /// Restrict to records leaving `state`.
    pub fn leaving(mut self, state: Scalar) -> Self {
        self.from_state = Some(state);
        self
    }

    /// Restrict to records entering `state`.
    pub fn entering(mut self, state: Scalar) -> Self {
        self.to_state = Some(state);
        self
    }

    /// Restrict to records at or after `instant`.
    pub fn since(mut self, instant: DateTime<Utc>) -> Self {
        self.changed_after = Some(instant);
        self
    }

    /// Order most recent first.
    pub fn newest_first(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Cap the result size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage backend for transition records.
///
/// Implementations own persistence of the append-only log; queries return
/// records ordered by `changed_at` in the requested direction.
pub trait HistoryStore {
    /// Append one record.
    fn append(&mut self, record: TransitionRecord) -> Result<(), HistoryError>;

    /// Fetch records matching the query, ordered and limited as requested.
    fn query(&self, query: &RecordQuery) -> Result<Vec<TransitionRecord>, HistoryError>;

    /// Count records matching the query.
    fn count(&self, query: &RecordQuery) -> Result<usize, HistoryError> {
        Ok(self.query(query)?.len())
    }
}

/// A contiguous interval of an entity's timeline.
///
/// Consecutive intervals chain: each `exited_at` equals the next interval's
/// `entered_at`. The final interval has `exited_at = None` and its duration
/// is measured against the time of the query.
#[derive(Clone, Debug, PartialEq)]
pub struct StateInterval {
    /// Stored form of the state occupied during the interval
    pub state: Scalar,
    /// When the state was entered
    pub entered_at: DateTime<Utc>,
    /// When the state was left; `None` for the current interval
    pub exited_at: Option<DateTime<Utc>>,
    /// Interval length; open intervals measure against now
    pub duration: Duration,
}

/// Records transitions and derives history queries from the log.
pub struct HistoryRecorder<H: HistoryStore> {
    store: H,
    enabled: bool,
}

impl<H: HistoryStore> HistoryRecorder<H> {
    /// Create an enabled recorder over `store`.
    pub fn new(store: H) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// Create a recorder with tracking switched off.
    pub fn disabled(store: H) -> Self {
        Self {
            store,
            enabled: false,
        }
    }

    /// Toggle tracking.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether tracking is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Access the underlying store.
    pub fn store(&self) -> &H {
        &self.store
    }

    /// Append a record for a committed transition.
    ///
    /// No-op when tracking is disabled or the entity has no identity yet.
    /// Storage and serialization failures are logged and swallowed.
    pub fn record<E: Entity>(
        &mut self,
        entity: &E,
        from: &E::State,
        to: &E::State,
        ctx: &TransitionContext,
    ) {
        if !self.enabled {
            return;
        }
        let Some(target_id) = entity.target_id() else {
            return;
        };

        let extras = ctx.extras();
        let context = if extras.is_empty() {
            None
        } else {
            match serde_json::to_value(extras) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(error = %err, "transition context not serializable, dropping blob");
                    None
                }
            }
        };

        let record = TransitionRecord {
            id: Uuid::new_v4(),
            target_id,
            target_type: E::target_type().to_string(),
            from_state: from.to_scalar(),
            to_state: to.to_scalar(),
            changed_at: Utc::now(),
            changed_by: ctx.changed_by().map(str::to_string),
            reason: ctx.reason().map(str::to_string),
            context,
        };

        if let Err(err) = self.store.append(record) {
            warn!(error = %err, "failed to append transition record");
        }
    }

    fn base_query<E: Entity>(entity: &E) -> Option<RecordQuery> {
        entity
            .target_id()
            .map(|id| RecordQuery::for_target(id, E::target_type()))
    }

    /// All records for this entity, ordered by `changed_at`.
    pub fn state_history<E: Entity>(
        &self,
        entity: &E,
        limit: Option<usize>,
        descending: bool,
    ) -> Result<Vec<TransitionRecord>, HistoryError> {
        let Some(mut query) = Self::base_query(entity) else {
            return Ok(Vec::new());
        };
        query.descending = descending;
        query.limit = limit;
        self.store.query(&query)
    }

    /// The most recent transition, if any.
    pub fn last_state_change<E: Entity>(
        &self,
        entity: &E,
    ) -> Result<Option<TransitionRecord>, HistoryError> {
        Ok(self.state_history(entity, Some(1), true)?.into_iter().next())
    }

    /// Number of recorded transitions for this entity.
    pub fn state_change_count<E: Entity>(&self, entity: &E) -> Result<usize, HistoryError> {
        let Some(query) = Self::base_query(entity) else {
            return Ok(0);
        };
        self.store.count(&query)
    }

    /// How long the entity has been (or was) in a state.
    ///
    /// With `state = None`, measures the current state: time since the most
    /// recent record entering it, or `None` when no such record exists.
    /// With an explicit state, measures from its most recent entry record to
    /// the first subsequent record leaving it; when no exit record exists
    /// the entity is presumed still there and the delta runs to now.
    pub fn time_in_state<E: Entity>(
        &self,
        entity: &E,
        state: Option<&E::State>,
    ) -> Result<Option<Duration>, HistoryError> {
        let Some(base) = Self::base_query(entity) else {
            return Ok(None);
        };

        let scalar = match state {
            Some(s) => s.to_scalar(),
            None => entity.current_state().to_scalar(),
        };

        let entry = self
            .store
            .query(&base.clone().entering(scalar.clone()).newest_first().limit(1))?
            .into_iter()
            .next();
        let Some(entry) = entry else {
            return Ok(None);
        };

        if state.is_none() {
            return Ok(Some(Utc::now() - entry.changed_at));
        }

        let exit = self
            .store
            .query(&base.leaving(scalar).since(entry.changed_at).limit(1))?
            .into_iter()
            .next();

        let end = exit.map(|r| r.changed_at).unwrap_or_else(Utc::now);
        Ok(Some(end - entry.changed_at))
    }

    /// Reconstruct the entity's timeline as contiguous intervals.
    ///
    /// Walks the log chronologically; each record opens an interval for its
    /// `to_state` that closes when the next record commits. The final
    /// interval is open (`exited_at = None`) and measured against now.
    pub fn states_timeline<E: Entity>(
        &self,
        entity: &E,
    ) -> Result<Vec<StateInterval>, HistoryError> {
        let records = self.state_history(entity, None, false)?;
        let now = Utc::now();

        let mut timeline = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let exited_at = records.get(i + 1).map(|next| next.changed_at);
            let duration = exited_at.unwrap_or(now) - record.changed_at;
            timeline.push(StateInterval {
                state: record.to_state.clone(),
                entered_at: record.changed_at,
                exited_at,
                duration,
            });
        }
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;

    crate::states! {
        enum DocState {
            Draft = "draft",
            Submitted = "submitted",
            Approved = "approved",
            Rejected = "rejected",
        }
    }

    struct Doc {
        id: Option<String>,
        state: DocState,
    }

    impl Entity for Doc {
        type State = DocState;

        fn current_state(&self) -> DocState {
            self.state.clone()
        }

        fn set_current_state(&mut self, next: DocState) {
            self.state = next;
        }

        fn target_type() -> &'static str {
            "document"
        }

        fn target_id(&self) -> Option<String> {
            self.id.clone()
        }
    }

    fn saved_doc() -> Doc {
        Doc {
            id: Some("doc-1".to_string()),
            state: DocState::Draft,
        }
    }

    fn record_at(
        seconds_ago: i64,
        from: &DocState,
        to: &DocState,
    ) -> TransitionRecord {
        TransitionRecord {
            id: Uuid::new_v4(),
            target_id: "doc-1".to_string(),
            target_type: "document".to_string(),
            from_state: from.to_scalar(),
            to_state: to.to_scalar(),
            changed_at: Utc::now() - Duration::seconds(seconds_ago),
            changed_by: None,
            reason: None,
            context: None,
        }
    }

    struct FailingStore;

    impl HistoryStore for FailingStore {
        fn append(&mut self, _record: TransitionRecord) -> Result<(), HistoryError> {
            Err(HistoryError::Storage(BoxError::from("backend down")))
        }

        fn query(&self, _query: &RecordQuery) -> Result<Vec<TransitionRecord>, HistoryError> {
            Err(HistoryError::Storage(BoxError::from("backend down")))
        }
    }

    #[test]
    fn record_appends_for_saved_entity() {
        let mut recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();

        recorder.record(
            &doc,
            &DocState::Draft,
            &DocState::Submitted,
            &TransitionContext::new(),
        );

        assert_eq!(recorder.state_change_count(&doc).unwrap(), 1);
    }

    #[test]
    fn record_skips_unsaved_entity() {
        let mut recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = Doc {
            id: None,
            state: DocState::Draft,
        };

        recorder.record(
            &doc,
            &DocState::Draft,
            &DocState::Submitted,
            &TransitionContext::new(),
        );

        assert_eq!(recorder.store().len(), 0);
    }

    #[test]
    fn record_skips_when_disabled() {
        let mut recorder = HistoryRecorder::disabled(InMemoryHistory::default());
        let doc = saved_doc();

        recorder.record(
            &doc,
            &DocState::Draft,
            &DocState::Submitted,
            &TransitionContext::new(),
        );

        assert_eq!(recorder.store().len(), 0);
        assert!(!recorder.is_enabled());
    }

    #[test]
    fn record_lifts_reserved_context_keys() {
        let mut recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();

        let ctx = TransitionContext::new()
            .with("reason", "review passed")
            .with("changed_by", "editor")
            .with("round", 2);
        recorder.record(&doc, &DocState::Submitted, &DocState::Approved, &ctx);

        let record = recorder.last_state_change(&doc).unwrap().unwrap();
        assert_eq!(record.reason.as_deref(), Some("review passed"));
        assert_eq!(record.changed_by.as_deref(), Some("editor"));

        let blob = record.context.unwrap();
        assert_eq!(blob.get("round").and_then(|v| v.as_i64()), Some(2));
        assert!(blob.get("reason").is_none());
    }

    #[test]
    fn record_swallows_storage_failures() {
        let mut recorder = HistoryRecorder::new(FailingStore);
        let doc = saved_doc();

        // Must not panic or surface the error.
        recorder.record(
            &doc,
            &DocState::Draft,
            &DocState::Submitted,
            &TransitionContext::new(),
        );
    }

    #[test]
    fn consecutive_records_chain() {
        let mut recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();
        let ctx = TransitionContext::new();

        let path = [
            (DocState::Draft, DocState::Submitted),
            (DocState::Submitted, DocState::Rejected),
            (DocState::Rejected, DocState::Draft),
            (DocState::Draft, DocState::Submitted),
            (DocState::Submitted, DocState::Approved),
        ];
        for (from, to) in &path {
            recorder.record(&doc, from, to, &ctx);
        }

        assert_eq!(recorder.state_change_count(&doc).unwrap(), 5);

        let records = recorder.state_history(&doc, None, false).unwrap();
        for pair in records.windows(2) {
            assert_eq!(pair[0].to_state, pair[1].from_state);
        }

        let last = recorder.last_state_change(&doc).unwrap().unwrap();
        assert_eq!(last.from_state, Scalar::from("submitted"));
        assert_eq!(last.to_state, Scalar::from("approved"));
    }

    #[test]
    fn history_respects_limit_and_order() {
        let mut recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();
        let ctx = TransitionContext::new();

        recorder.record(&doc, &DocState::Draft, &DocState::Submitted, &ctx);
        recorder.record(&doc, &DocState::Submitted, &DocState::Approved, &ctx);

        let newest = recorder.state_history(&doc, Some(1), true).unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].to_state, Scalar::from("approved"));
    }

    #[test]
    fn time_in_current_state_measures_since_entry() {
        let mut store = InMemoryHistory::default();
        store
            .append(record_at(300, &DocState::Draft, &DocState::Submitted))
            .unwrap();
        let recorder = HistoryRecorder::new(store);

        let doc = Doc {
            id: Some("doc-1".to_string()),
            state: DocState::Submitted,
        };

        let elapsed = recorder.time_in_state(&doc, None).unwrap().unwrap();
        assert!(elapsed >= Duration::seconds(300));
        assert!(elapsed < Duration::seconds(305));
    }

    #[test]
    fn time_in_past_state_uses_exit_record() {
        let mut store = InMemoryHistory::default();
        store
            .append(record_at(600, &DocState::Draft, &DocState::Submitted))
            .unwrap();
        store
            .append(record_at(100, &DocState::Submitted, &DocState::Approved))
            .unwrap();
        let recorder = HistoryRecorder::new(store);

        let doc = Doc {
            id: Some("doc-1".to_string()),
            state: DocState::Approved,
        };

        let spent = recorder
            .time_in_state(&doc, Some(&DocState::Submitted))
            .unwrap()
            .unwrap();
        // Entered 600s ago, left 100s ago.
        assert!(spent >= Duration::seconds(499));
        assert!(spent <= Duration::seconds(501));
    }

    #[test]
    fn time_in_state_without_exit_runs_to_now() {
        let mut store = InMemoryHistory::default();
        store
            .append(record_at(200, &DocState::Draft, &DocState::Submitted))
            .unwrap();
        let recorder = HistoryRecorder::new(store);

        let doc = Doc {
            id: Some("doc-1".to_string()),
            state: DocState::Submitted,
        };

        let spent = recorder
            .time_in_state(&doc, Some(&DocState::Submitted))
            .unwrap()
            .unwrap();
        assert!(spent >= Duration::seconds(200));
    }

    #[test]
    fn time_in_state_is_none_without_entry_record() {
        let recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();

        assert!(recorder.time_in_state(&doc, None).unwrap().is_none());
        assert!(recorder
            .time_in_state(&doc, Some(&DocState::Approved))
            .unwrap()
            .is_none());
    }

    #[test]
    fn timeline_intervals_are_contiguous() {
        let mut store = InMemoryHistory::default();
        store
            .append(record_at(900, &DocState::Draft, &DocState::Submitted))
            .unwrap();
        store
            .append(record_at(600, &DocState::Submitted, &DocState::Rejected))
            .unwrap();
        store
            .append(record_at(300, &DocState::Rejected, &DocState::Draft))
            .unwrap();
        let recorder = HistoryRecorder::new(store);

        let doc = saved_doc();
        let timeline = recorder.states_timeline(&doc).unwrap();

        assert_eq!(timeline.len(), 3);
        for pair in timeline.windows(2) {
            assert_eq!(pair[0].exited_at, Some(pair[1].entered_at));
        }

        let last = timeline.last().unwrap();
        assert_eq!(last.exited_at, None);
        assert_eq!(last.state, Scalar::from("draft"));
        assert!(last.duration >= Duration::seconds(300));
    }

    #[test]
    fn timeline_is_empty_without_history() {
        let recorder = HistoryRecorder::new(InMemoryHistory::default());
        let doc = saved_doc();
        assert!(recorder.states_timeline(&doc).unwrap().is_empty());
    }
}
