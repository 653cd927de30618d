//! Newest-first history list and its reconciliation with remote fetches.

use chrono::Duration;
use tracing::debug;

use super::filter::HistoryFilter;
use super::record::{PredictionRecord, Provenance, RecordId};

/// Largest timestamp gap for an optimistic record to match a server record.
pub const RECONCILE_WINDOW_SECS: i64 = 5 * 60;

/// Largest confidence difference for an optimistic record to match.
const CONFIDENCE_EPSILON: f64 = 0.01;

/// How a successful fetch is merged into local history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Keep optimistic records the fetch does not account for.
    #[default]
    MergeOptimistic,
    /// Replace everything with the fetched list.
    Replace,
}

/// Ordered history, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryCollection {
    records: Vec<PredictionRecord>,
}

impl HistoryCollection {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredictionRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn first(&self) -> Option<&PredictionRecord> {
        self.records.first()
    }

    pub fn get(&self, id: &RecordId) -> Option<&PredictionRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Prepend a record created locally.
    pub fn record_optimistic(&mut self, record: PredictionRecord) {
        self.records.insert(0, record);
    }

    /// Remove the first record with `id`.
    pub fn remove(&mut self, id: &RecordId) -> Option<PredictionRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Merge a fetched server list into local state.
    ///
    /// With [`ReconcilePolicy::MergeOptimistic`], each optimistic record is
    /// dropped when a fetched record matches it (same filename and label,
    /// confidence within 0.01, both timestamps parseable and within the
    /// reconcile window). Each fetched record confirms at most one optimistic
    /// record. Unmatched optimistic records stay in front, in order.
    pub fn reconcile(&mut self, fetched: Vec<PredictionRecord>, policy: ReconcilePolicy) {
        let pending: Vec<PredictionRecord> = match policy {
            ReconcilePolicy::Replace => Vec::new(),
            ReconcilePolicy::MergeOptimistic => {
                let mut claimed = vec![false; fetched.len()];
                self.records
                    .drain(..)
                    .filter(|r| r.provenance() == Provenance::Optimistic)
                    .filter(|local| {
                        let matched = fetched
                            .iter()
                            .enumerate()
                            .find(|(i, remote)| !claimed[*i] && confirms(remote, local));
                        match matched {
                            Some((i, remote)) => {
                                debug!(local = %local.id, remote = %remote.id, "Optimistic record confirmed");
                                claimed[i] = true;
                                false
                            }
                            None => true,
                        }
                    })
                    .collect()
            }
        };

        debug!(
            fetched = fetched.len(),
            kept_optimistic = pending.len(),
            "Reconciled history"
        );

        self.records = pending;
        self.records.extend(fetched);
    }

    /// Records matching `filter`, in order. Does not modify `self`.
    pub fn filter(&self, filter: &HistoryFilter) -> HistoryCollection {
        HistoryCollection::new(
            self.records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a HistoryCollection {
    type Item = &'a PredictionRecord;
    type IntoIter = std::slice::Iter<'a, PredictionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<PredictionRecord> for HistoryCollection {
    fn from_iter<I: IntoIterator<Item = PredictionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn confirms(remote: &PredictionRecord, local: &PredictionRecord) -> bool {
    if remote.provenance() != Provenance::Confirmed
        || remote.filename != local.filename
        || remote.label != local.label
        || (remote.confidence - local.confidence).abs() > CONFIDENCE_EPSILON
    {
        return false;
    }

    // A malformed timestamp on either side never confirms.
    match (remote.parsed_timestamp(), local.parsed_timestamp()) {
        (Some(a), Some(b)) => (a - b).abs() <= Duration::seconds(RECONCILE_WINDOW_SECS),
        _ => false,
    }
}
