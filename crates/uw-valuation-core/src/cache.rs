//! Memoized valuation keyed on a structural fingerprint of the snapshot.

use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::UnderwritingSnapshot;
use crate::types::ComputationOutput;
use crate::valuation::model::{value_model, ModelValuation};

/// Hash of every record, parameter and config value in `snapshot`.
pub fn fingerprint(snapshot: &UnderwritingSnapshot) -> u64 {
    let mut hasher = DefaultHasher::new();
    snapshot.hash(&mut hasher);
    hasher.finish()
}

/// The snapshot a cached valuation was computed from.
#[derive(Debug)]
struct Entry {
    fingerprint: u64,
    snapshot: UnderwritingSnapshot,
    output: ComputationOutput<ModelValuation>,
}

/// Holds the most recent valuation and reuses it while the snapshot is
/// unchanged. Owned by the caller; re-run after every edit.
///
/// The fingerprint only narrows the check; a hit also requires the stored
/// snapshot to compare equal.
#[derive(Debug, Default)]
pub struct ValuationCache {
    last: Option<Entry>,
    hits: u64,
    misses: u64,
}

impl ValuationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&mut self, snapshot: &UnderwritingSnapshot) -> &ComputationOutput<ModelValuation> {
        let key = fingerprint(snapshot);
        let hit = self
            .last
            .as_ref()
            .is_some_and(|e| e.fingerprint == key && e.snapshot == *snapshot);
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.last = None;
            debug!("event=cache_miss module=cache status=recompute fingerprint={key:016x}");
        }
        let entry = self.last.get_or_insert_with(|| Entry {
            fingerprint: key,
            snapshot: snapshot.clone(),
            output: value_model(snapshot),
        });
        &entry.output
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
