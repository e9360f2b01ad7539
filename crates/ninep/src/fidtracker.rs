//! Tracks live fids: the distinguished root entry plus walked secondary
//! entries, keyed by numeric fid for O(1)-amortized lookup.

use std::collections::HashMap;

use crate::fcall::Fid;
use crate::wire::Qid;

/// A live fid's tracked state: the walked path that produced it and the
/// qid the server last reported for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FidEntry {
    pub fid: Fid,
    pub wnames: Vec<String>,
    pub qid: Qid,
}

#[derive(Default)]
pub struct FidTracker {
    root: Option<FidEntry>,
    entries: HashMap<Fid, FidEntry>,
}

impl FidTracker {
    pub fn new() -> FidTracker {
        FidTracker::default()
    }

    /// Records the root fid. Intended to be called exactly once per session,
    /// during attach.
    pub fn set_root(&mut self, fid: Fid, qid: Qid) {
        self.root = Some(FidEntry { fid, wnames: Vec::new(), qid });
    }

    pub fn root_entry(&self) -> Option<&FidEntry> {
        self.root.as_ref()
    }

    /// Records a fid produced by a successful walk.
    pub fn add(&mut self, fid: Fid, wnames: Vec<String>, qid: Qid) {
        self.entries.insert(fid, FidEntry { fid, wnames, qid });
    }

    pub fn lookup(&self, fid: Fid) -> Option<&FidEntry> {
        self.entries.get(&fid)
    }

    /// Removes a fid after a successful clunk. No-op if the fid was never
    /// tracked (e.g. it never became live at the server).
    pub fn remove(&mut self, fid: Fid) {
        self.entries.remove(&fid);
    }

    /// Number of live secondary fids, excluding the root. Used by tests to
    /// assert no-fid-leak properties.
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::QidType;

    fn qid(path: u64) -> Qid {
        Qid { typ: QidType::FILE, version: 0, path }
    }

    #[test]
    fn add_lookup_remove_round_trip() {
        let mut tracker = FidTracker::new();
        tracker.set_root(0, qid(0));
        assert_eq!(tracker.live_count(), 0);

        tracker.add(1, vec!["a".into()], qid(1));
        assert_eq!(tracker.live_count(), 1);
        assert_eq!(tracker.lookup(1).unwrap().wnames, vec!["a".to_string()]);

        tracker.remove(1);
        assert_eq!(tracker.live_count(), 0);
        assert!(tracker.lookup(1).is_none());
    }

    #[test]
    fn removing_an_untracked_fid_is_a_no_op() {
        let mut tracker = FidTracker::new();
        tracker.remove(99);
        assert_eq!(tracker.live_count(), 0);
    }
}
