use dashmap::DashMap;

use crate::request::Request;

/// Process-wide overwrite-last-wins map of request id to latest value.
///
/// Accumulates IN_PROGRESS, COMPLETED, and FAILED records as a request's
/// lifecycle unfolds; only the most recent write for a given id survives,
/// which is exactly what the final report needs. Readers (the report
/// writer, the dashboard) always see a self-consistent snapshot, never a
/// torn entry.
#[derive(Default)]
pub struct TerminalSet {
    records: DashMap<String, Request>,
}

impl TerminalSet {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Records (or overwrites) the latest value for `request.id`.
    pub fn record(&self, request: Request) {
        self.records.insert(request.id.clone(), request);
    }

    pub fn get(&self, id: &str) -> Option<Request> {
        self.records.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only copy for the report writer and dashboard.
    pub fn snapshot(&self) -> Vec<Request> {
        self.records.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Part, RequestStatus};

    fn req() -> Request {
        Request::create(Some(Part::new("P1", "n", "d")), 1).unwrap()
    }

    #[test]
    fn later_write_overwrites_earlier_for_same_id() {
        let set = TerminalSet::new();
        let r = req();
        set.record(r.with_status(RequestStatus::InProgress));
        set.record(r.with_status(RequestStatus::Completed));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&r.id).unwrap().status, RequestStatus::Completed);
    }

    #[test]
    fn snapshot_reflects_distinct_ids() {
        let set = TerminalSet::new();
        let a = req();
        let b = req();
        set.record(a.with_status(RequestStatus::Completed));
        set.record(b.with_status(RequestStatus::Failed));

        let snap = set.snapshot();
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn absent_id_is_none() {
        let set = TerminalSet::new();
        assert!(set.get("Task-nope").is_none());
    }
}
