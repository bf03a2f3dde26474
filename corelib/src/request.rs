use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SimError;
use crate::part::Part;
use crate::status::RequestStatus;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable task: a request for `qty` units of `part`. A state transition
/// produces a new value sharing `id`; ids are minted from a process-wide
/// monotonic counter and are unique within a process run (not required to
/// be gapless across test runs).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Request {
    pub id: String,
    pub part: Part,
    pub qty: u32,
    pub status: RequestStatus,
}

impl Request {
    /// Mints a fresh PENDING request. Fails validation when `part` is
    /// absent or `qty` is not strictly positive; never retried by callers.
    pub fn create(part: Option<Part>, qty: i64) -> Result<Self, SimError> {
        let part = part.ok_or_else(|| SimError::Validation("Part cannot be null".into()))?;
        if qty <= 0 {
            return Err(SimError::Validation("Quantity must be positive".into()));
        }

        let n = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            id: format!("Task-{n}"),
            part,
            qty: qty as u32,
            status: RequestStatus::Pending,
        })
    }

    /// Returns a new value sharing `id`, `part`, `qty` with the given status.
    pub fn with_status(&self, status: RequestStatus) -> Self {
        Self {
            id: self.id.clone(),
            part: self.part.clone(),
            qty: self.qty,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part() -> Part {
        Part::new("P1001", "Bolt", "M6 hex bolt")
    }

    #[test]
    fn create_rejects_missing_part() {
        let err = Request::create(None, 1).unwrap_err();
        assert_eq!(err, SimError::Validation("Part cannot be null".into()));
    }

    #[test]
    fn create_rejects_zero_qty() {
        let err = Request::create(Some(part()), 0).unwrap_err();
        assert_eq!(err, SimError::Validation("Quantity must be positive".into()));
    }

    #[test]
    fn create_rejects_negative_qty() {
        let err = Request::create(Some(part()), -5).unwrap_err();
        assert_eq!(err, SimError::Validation("Quantity must be positive".into()));
    }

    #[test]
    fn create_succeeds_and_is_pending() {
        let r = Request::create(Some(part()), 5).unwrap();
        assert_eq!(r.status, RequestStatus::Pending);
        assert_eq!(r.qty, 5);
        assert!(r.id.starts_with("Task-"));
    }

    #[test]
    fn concurrent_creates_receive_distinct_ids() {
        let ids: std::collections::HashSet<_> = (0..100)
            .map(|_| Request::create(Some(part()), 1).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn with_status_preserves_id_part_qty() {
        let r = Request::create(Some(part()), 3).unwrap();
        let done = r.with_status(RequestStatus::Completed);

        assert_eq!(done.id, r.id);
        assert_eq!(done.part, r.part);
        assert_eq!(done.qty, r.qty);
        assert_eq!(done.status, RequestStatus::Completed);
    }

    #[test]
    fn with_status_is_idempotent() {
        let r = Request::create(Some(part()), 3).unwrap();
        let once = r.with_status(RequestStatus::Failed);
        let twice = once.with_status(RequestStatus::Failed);
        assert_eq!(once, twice);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = RequestStatus> {
        prop_oneof![
            Just(RequestStatus::Pending),
            Just(RequestStatus::InProgress),
            Just(RequestStatus::Completed),
            Just(RequestStatus::Failed),
        ]
    }

    proptest! {
        /// `with_status(s).with_status(s) == with_status(s)` for any qty and
        /// any target status, preserving id and part.
        #[test]
        fn with_status_is_idempotent_for_any_status(qty in 1i64..10_000, status in any_status()) {
            let part = Part::new("P1001", "Bolt", "M6 hex bolt");
            let r = Request::create(Some(part), qty).unwrap();

            let once = r.with_status(status);
            let twice = once.clone().with_status(status);

            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.id, r.id);
            prop_assert_eq!(once.part, r.part);
            prop_assert_eq!(once.qty, r.qty);
        }
    }
}
