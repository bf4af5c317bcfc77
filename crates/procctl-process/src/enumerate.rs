//! Process enumeration.

use chrono::{DateTime, Utc};
use procctl_common::{ProcId, Result};
use serde::Serialize;
use tracing::debug;

use crate::check::proc_id_from_self;
use crate::platform::{Enumerate, Native};

/// Point-in-time list of process ids.
///
/// Stale the moment any process starts or exits; it is never refreshed.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessList {
    pids: Vec<ProcId>,
    captured_at: DateTime<Utc>,
}

impl ProcessList {
    pub fn new(pids: Vec<ProcId>) -> Self {
        Self {
            pids,
            captured_at: Utc::now(),
        }
    }

    /// Bounds-checked access.
    pub fn get(&self, index: usize) -> Option<ProcId> {
        self.pids.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn contains(&self, pid: ProcId) -> bool {
        self.pids.contains(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProcId> + '_ {
        self.pids.iter().copied()
    }

    pub fn as_slice(&self) -> &[ProcId] {
        &self.pids
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Snapshot every running process id, in ascending order.
///
/// The calling process is always part of the list.
pub fn list_all_proc_ids() -> Result<ProcessList> {
    let mut pids = Native::list_proc_ids()?;

    let me = proc_id_from_self();
    if let Err(index) = pids.binary_search(&me) {
        pids.insert(index, me);
    }

    debug!("Captured process list with {} entries", pids.len());
    Ok(ProcessList::new(pids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_contains_self_and_is_sorted() {
        let list = list_all_proc_ids().unwrap();
        assert!(list.contains(proc_id_from_self()));
        assert!(list.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_out_of_range_access() {
        let list = ProcessList::new(vec![ProcId::from_raw(10), ProcId::from_raw(20)]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1), Some(ProcId::from_raw(20)));
        assert_eq!(list.get(2), None);
        assert_eq!(list.get(usize::MAX), None);
    }
}
