//! Counter registry: `counter_id -> SharedCounter`.
//!
//! The core counter knows nothing about ids or capacity; this map is owned by
//! the hosting layer. Callers get an `Arc` clone so no shard lock is held
//! while a counter operation runs.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use tally_core::error::{Result, TallyError};
use tally_core::SharedCounter;

/// Longest accepted counter id, in bytes.
pub const MAX_ID_LEN: usize = 64;

/// Check that `id` is 1..=64 chars of `[A-Za-z0-9_.-]`.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(TallyError::BadRequest(format!(
            "counter id must be 1..={MAX_ID_LEN} bytes"
        )));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return Err(TallyError::BadRequest(format!(
            "counter id has invalid characters: {id:?}"
        )));
    }
    Ok(())
}

pub struct CounterRegistry {
    counters: DashMap<String, Arc<SharedCounter>>,
    // Reserved slots; may briefly run ahead of `counters.len()` during a create.
    // Only released by `destroy`.
    reserved: AtomicUsize,
    seq: AtomicU64,
    max_instances: usize,
}

impl CounterRegistry {
    pub fn new(max_instances: usize) -> Self {
        Self {
            counters: DashMap::new(),
            reserved: AtomicUsize::new(0),
            seq: AtomicU64::new(1),
            max_instances,
        }
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Deploy a fresh counter (value 0) and return its id.
    ///
    /// Without a requested id, one of the form `c-<n>` is generated, skipping
    /// any that an earlier explicit create already took.
    pub fn create(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(id) => {
                validate_id(id)?;
                self.insert_new(id.to_string())
            }
            None => self.insert_generated(),
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<SharedCounter>> {
        self.counters
            .get(id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| TallyError::NotFound(id.to_string()))
    }

    pub fn destroy(&self, id: &str) -> Result<()> {
        self.counters
            .remove(id)
            .ok_or_else(|| TallyError::NotFound(id.to_string()))?;
        self.release();
        Ok(())
    }

    /// Sorted snapshot of live ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.counters.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    fn reserve(&self) -> Result<()> {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_instances).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| TallyError::RegistryFull)
    }

    fn release(&self) {
        self.reserved.fetch_sub(1, Ordering::AcqRel);
    }

    fn insert_new(&self, id: String) -> Result<String> {
        match self.counters.entry(id) {
            Entry::Occupied(e) => Err(TallyError::AlreadyExists(e.key().clone())),
            Entry::Vacant(e) => {
                // Reserved under the shard lock: a taken id never consumes a slot.
                self.reserve()?;
                let id = e.key().clone();
                e.insert(Arc::new(SharedCounter::new()));
                Ok(id)
            }
        }
    }

    fn insert_generated(&self) -> Result<String> {
        loop {
            let n = self.seq.fetch_add(1, Ordering::Relaxed);
            match self.insert_new(format!("c-{n}")) {
                Err(TallyError::AlreadyExists(_)) => continue,
                res => return res,
            }
        }
    }
}
