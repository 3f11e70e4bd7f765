// File: src/cache/claim_cache.rs

use dashmap::DashMap;
use uuid::Uuid;

use codedrop_common::models::ClaimRecord;

/// In-memory mirror of the ledger for one active event.
///
/// Purely an accelerator for duplicate detection: entries are inserted only
/// after a ledger write has succeeded, and the whole map can be rebuilt from
/// ledger truth at any time. It may lag the ledger briefly and is never the
/// source of truth.
pub struct ClaimCache {
    claims: DashMap<Uuid, ClaimRecord>,
}

impl ClaimCache {
    pub fn new() -> Self {
        Self {
            claims: DashMap::new(),
        }
    }

    /// O(1) membership pre-filter.
    pub fn has(&self, participant_id: Uuid) -> bool {
        self.claims.contains_key(&participant_id)
    }

    /// Insert a record that the ledger has already accepted.
    pub fn record(&self, record: ClaimRecord) {
        self.claims.insert(record.participant_id, record);
    }

    /// Live claim count, for display.
    pub fn size(&self) -> usize {
        self.claims.len()
    }

    /// Replace the whole mirror with ledger truth.
    pub fn rebuild(&self, records: Vec<ClaimRecord>) {
        self.claims.clear();
        for record in records {
            self.claims.insert(record.participant_id, record);
        }
    }
}

impl Default for ClaimCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_and_size() {
        let cache = ClaimCache::new();
        let event_id = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        assert!(!cache.has(p1));
        assert_eq!(cache.size(), 0);

        cache.record(ClaimRecord::new(event_id, p1));
        assert!(cache.has(p1));
        assert!(!cache.has(p2));
        assert_eq!(cache.size(), 1);

        // re-recording the same participant does not grow the cache
        cache.record(ClaimRecord::new(event_id, p1));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn rebuild_replaces_contents() {
        let cache = ClaimCache::new();
        let event_id = Uuid::new_v4();
        let stale = Uuid::new_v4();
        cache.record(ClaimRecord::new(event_id, stale));

        let fresh: Vec<_> = (0..3)
            .map(|_| ClaimRecord::new(event_id, Uuid::new_v4()))
            .collect();
        let fresh_ids: Vec<_> = fresh.iter().map(|r| r.participant_id).collect();

        cache.rebuild(fresh);

        assert_eq!(cache.size(), 3);
        assert!(!cache.has(stale));
        for id in fresh_ids {
            assert!(cache.has(id));
        }
    }
}
