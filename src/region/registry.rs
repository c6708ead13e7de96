// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reference-counted registry of mapped regions.
//!
//! The registry maps stream identifiers to mapping handles so multiple
//! logical consumers share one OS mapping; the last consumer's release is
//! what truly closes it. Instances are explicitly constructed and dropped;
//! there is no global singleton and no lazy first-use construction, which
//! keeps shutdown ordering deterministic.
//!
//! All lifecycle transitions go through one mutex, so a concurrent
//! acquire/release pair can never observe a half-disposed entry and counts
//! can never go below zero. Open/create failures are recorded per identifier
//! in a side table and retrievable without an error path, so bulk-open
//! workflows continue past soft failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::core::{Result, ViewError};
use crate::region::access::{AccessMode, PersistMode};
use crate::region::mapped::MappedRegion;
use crate::region::stream_id::StreamId;

/// Result of a non-acquiring registry probe.
///
/// An explicit tagged result instead of error-driven dispatch: callers
/// deciding between "use the existing mapping" and "create one" match on
/// this.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The identifier is mapped; the handle is returned without touching the
    /// reference count.
    Found(Arc<MappedRegion>),
    /// The identifier has never been mapped (or was fully released).
    NotFound,
    /// The most recent open/create attempt for this identifier failed.
    Error(String),
}

struct Entry {
    region: Arc<MappedRegion>,
    ref_count: usize,
}

/// Process-wide table of mapped regions keyed by [`StreamId`].
pub struct MappingRegistry {
    entries: Mutex<HashMap<StreamId, Entry>>,
    last_errors: Mutex<HashMap<StreamId, String>>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            last_errors: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the entry table, centralizing poison handling. A poisoned lock
    /// only means a panic elsewhere mid-update of a plain integer count, so
    /// the table itself is still consistent.
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<StreamId, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn errors(&self) -> std::sync::MutexGuard<'_, HashMap<StreamId, String>> {
        self.last_errors.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire the region for `id`, opening it on first request.
    ///
    /// Repeated requests for the same identifier increment the reference
    /// count and return the same handle. On failure the error message is
    /// recorded for [`last_error`](Self::last_error) and no entry is left
    /// behind.
    pub fn acquire(
        &self,
        id: &StreamId,
        mode: AccessMode,
        persist: &PersistMode,
        size: Option<u64>,
    ) -> Result<Arc<MappedRegion>> {
        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(id) {
            entry.ref_count += 1;
            debug!(id = %id, ref_count = entry.ref_count, "mapping reacquired");
            return Ok(Arc::clone(&entry.region));
        }

        // The map lock is held across the open so a force_close for this id
        // cannot interleave with a half-registered handle.
        match MappedRegion::open(id.clone(), mode, persist, size) {
            Ok(region) => {
                let region = Arc::new(region);
                entries.insert(
                    id.clone(),
                    Entry {
                        region: Arc::clone(&region),
                        ref_count: 1,
                    },
                );
                self.errors().remove(id);
                debug!(id = %id, len = region.len(), "mapping created");
                Ok(region)
            }
            Err(err) => {
                warn!(id = %id, error = %err, "mapping open failed");
                self.errors().insert(id.clone(), err.to_string());
                Err(err)
            }
        }
    }

    /// Release one reference to `id`.
    ///
    /// Returns `true` when this was the last reference and the mapping was
    /// disposed. Releasing an identifier that is not mapped is an error, so
    /// the count can never go below zero.
    pub fn release(&self, id: &StreamId) -> Result<bool> {
        let mut entries = self.entries();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| ViewError::not_found(id.to_string()))?;
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            entries.remove(id);
            debug!(id = %id, "mapping disposed");
            return Ok(true);
        }
        debug!(id = %id, ref_count = entry.ref_count, "mapping released");
        Ok(false)
    }

    /// Remove `id` regardless of its reference count and invalidate
    /// outstanding handles.
    ///
    /// Used when the backing file is being refreshed during active
    /// acquisition and stale mappings must not be reused. Reads already in
    /// progress complete against pages their `Arc` keeps alive; every future
    /// view, reader, or writer acquisition on an outstanding handle fails
    /// with `RegionClosed`. Returns `true` if an entry was removed.
    pub fn force_close(&self, id: &StreamId) -> bool {
        let mut entries = self.entries();
        match entries.remove(id) {
            Some(entry) => {
                entry.region.mark_closed();
                warn!(id = %id, ref_count = entry.ref_count, "mapping force-closed");
                true
            }
            None => false,
        }
    }

    /// Force-close every mapping. Explicit teardown for shutdown paths;
    /// returns the number of entries removed.
    pub fn close_all(&self) -> usize {
        let mut entries = self.entries();
        let count = entries.len();
        for (id, entry) in entries.drain() {
            entry.region.mark_closed();
            warn!(id = %id, "mapping force-closed at teardown");
        }
        count
    }

    /// Probe the state of `id` without acquiring it.
    pub fn lookup(&self, id: &StreamId) -> Lookup {
        let entries = self.entries();
        if let Some(entry) = entries.get(id) {
            return Lookup::Found(Arc::clone(&entry.region));
        }
        drop(entries);
        match self.errors().get(id) {
            Some(message) => Lookup::Error(message.clone()),
            None => Lookup::NotFound,
        }
    }

    /// The message of the most recent failed open for `id`, if any.
    /// Cleared by the next successful acquire.
    pub fn last_error(&self, id: &StreamId) -> Option<String> {
        self.errors().get(id).cloned()
    }

    /// Current reference count for `id`, if mapped.
    pub fn ref_count(&self, id: &StreamId) -> Option<usize> {
        self.entries().get(id).map(|e| e.ref_count)
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if no mappings are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("mappings", &self.len())
            .finish()
    }
}
