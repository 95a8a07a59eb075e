//! Artifact cache: at-most-once compilation per key.
//!
//! ## Locking
//!
//! Two levels of locks:
//!
//! 1. the slot map (`slots`): held only briefly, to find, insert or drop a
//!    key's slot;
//! 2. the slot itself: held for the whole generate + compile cycle.
//!
//! The map lock is never held while blocking on a slot lock; code holding
//! the map only ever `try_lock`s slots. A slot holder may take the map lock.
//!
//! Callers racing on the same key queue on its slot lock; the first one
//! compiles, the rest find the artifact once they get the lock. A caller that
//! wakes up on a slot which has since left the map starts over with the
//! key's current slot. Callers on different keys never wait for each other's
//! compiles.
//!
//! ## Eviction
//!
//! With a capacity set, the slot map is kept in least-recently-used order.
//! Only settled slots (compiled, or holding a remembered failure) count
//! towards the capacity, and only unlocked settled slots are evicted, so a
//! compile in flight is never dropped from under its waiters. An evicted
//! artifact stays alive for any caller still holding its `Arc`.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::Mutex;

use stencil_core::{EngineConfig, FailurePolicy, TemplateError};

use crate::fingerprint::Fingerprint;
use crate::pipeline::{compile_template, CompileInput, CompiledArtifact, CompilerPipeline, PipelineOptions};

const VACANT: u8 = 0;
const READY: u8 = 1;
const FAILED: u8 = 2;

enum SlotState<L> {
    Vacant,
    Ready(Arc<CompiledArtifact<L>>),
    Failed {
        fingerprint: Fingerprint,
        error: TemplateError,
    },
}

impl<L> SlotState<L> {
    fn status(&self) -> u8 {
        match self {
            SlotState::Vacant => VACANT,
            SlotState::Ready(_) => READY,
            SlotState::Failed { .. } => FAILED,
        }
    }
}

struct Slot<L> {
    state: Mutex<SlotState<L>>,
    /// Mirror of `state`'s variant, readable without the lock.
    status: AtomicU8,
}

impl<L> Slot<L> {
    fn vacant() -> Self {
        Self {
            state: Mutex::new(SlotState::Vacant),
            status: AtomicU8::new(VACANT),
        }
    }

    fn status(&self) -> u8 {
        self.status.load(Ordering::Acquire)
    }

    fn is_ready(&self) -> bool {
        self.status() == READY
    }

    fn is_settled(&self) -> bool {
        self.status() != VACANT
    }

    fn publish(&self, state: &SlotState<L>) {
        self.status.store(state.status(), Ordering::Release);
    }
}

/// Compiled-artifact cache owned by one engine.
pub struct TemplateCache<L> {
    slots: Mutex<IndexMap<String, Arc<Slot<L>>>>,
    capacity: Option<NonZeroUsize>,
    failure_policy: FailurePolicy,
}

impl<L> Default for TemplateCache<L> {
    fn default() -> Self {
        Self::new(None, FailurePolicy::default())
    }
}

impl<L> TemplateCache<L> {
    /// Create a cache holding at most `capacity` artifacts (`None` = unbounded,
    /// `Some(0)` is treated as unbounded too).
    pub fn new(capacity: Option<usize>, failure_policy: FailurePolicy) -> Self {
        Self {
            slots: Mutex::new(IndexMap::new()),
            capacity: capacity.and_then(NonZeroUsize::new),
            failure_policy,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity, config.failure_policy)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    /// Fingerprint `input`, then return the cached artifact for its key or
    /// compile it through `pipeline`.
    pub fn get_or_compile<P>(
        &self,
        pipeline: &P,
        input: &CompileInput<'_>,
        options: &PipelineOptions,
    ) -> Result<Arc<CompiledArtifact<L>>, TemplateError>
    where
        P: CompilerPipeline<Loadable = L> + ?Sized,
    {
        let fingerprint = input.fingerprint();
        let key = input.name.unwrap_or(fingerprint.as_str());
        self.get_or_compile_with(key, &fingerprint, || {
            compile_template(pipeline, input, options)
        })
    }

    /// Return the artifact cached under `key` if it was built from inputs
    /// with `fingerprint`; otherwise run `compile` while holding the key's
    /// lock and cache its result.
    ///
    /// A key reused with a different fingerprint is recompiled and replaced.
    /// Under [`FailurePolicy::Retry`] a failed first compile leaves no entry
    /// behind.
    pub fn get_or_compile_with<F>(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        compile: F,
    ) -> Result<Arc<CompiledArtifact<L>>, TemplateError>
    where
        F: FnOnce() -> Result<CompiledArtifact<L>, TemplateError>,
    {
        loop {
            let slot = self.slot(key);
            let mut state = slot.state.lock();
            if !self.is_current(key, &slot) {
                // evicted, removed or discarded while we waited
                continue;
            }

            match &*state {
                SlotState::Ready(artifact) if artifact.fingerprint() == fingerprint => {
                    tracing::debug!("cache hit: {key}");
                    return Ok(Arc::clone(artifact));
                }
                SlotState::Failed {
                    fingerprint: failed,
                    error,
                } if failed == fingerprint && self.failure_policy == FailurePolicy::Remember => {
                    tracing::debug!("cached failure: {key}");
                    return Err(error.clone());
                }
                _ => {}
            }

            let started = Instant::now();
            let result = match compile() {
                Ok(artifact) => {
                    let artifact = Arc::new(artifact);
                    *state = SlotState::Ready(Arc::clone(&artifact));
                    slot.publish(&state);
                    tracing::info!("compiled: {key} in {:?}", started.elapsed());
                    Ok(artifact)
                }
                Err(error) => {
                    tracing::warn!("compile failed: {key}: {error}");
                    match self.failure_policy {
                        FailurePolicy::Remember => {
                            *state = SlotState::Failed {
                                fingerprint: fingerprint.clone(),
                                error: error.clone(),
                            };
                            slot.publish(&state);
                        }
                        FailurePolicy::Retry => {
                            if matches!(*state, SlotState::Vacant) {
                                self.discard(key, &slot);
                            }
                        }
                    }
                    Err(error)
                }
            };

            // Our slot stays locked here, so it is never its own victim.
            self.enforce_capacity();
            return result;
        }
    }

    /// The artifact cached under `key`, if any.
    ///
    /// Waits for an in-flight compile of the same key to finish.
    pub fn get(&self, key: &str) -> Option<Arc<CompiledArtifact<L>>> {
        let slot = {
            let mut slots = self.slots.lock();
            let index = slots.get_index_of(key)?;
            Self::touch(&mut slots, index)
        };
        let state = slot.state.lock();
        match &*state {
            SlotState::Ready(artifact) => Some(Arc::clone(artifact)),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop the entry for `key`. Returns `true` if an artifact was cached.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.slots.lock().shift_remove(key);
        removed.is_some_and(|slot| slot.is_ready())
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of cached artifacts. Keys still compiling are not counted.
    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|slot| slot.is_ready()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of cached artifacts, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.is_ready())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Find or insert the slot for `key`, marking it most recently used.
    fn slot(&self, key: &str) -> Arc<Slot<L>> {
        let mut slots = self.slots.lock();
        if let Some(index) = slots.get_index_of(key) {
            return Self::touch(&mut slots, index);
        }
        let slot = Arc::new(Slot::vacant());
        slots.insert(key.to_owned(), Arc::clone(&slot));
        slot
    }

    fn is_current(&self, key: &str, slot: &Arc<Slot<L>>) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drop `slot` from the map if it is still the entry for `key`.
    fn discard(&self, key: &str, slot: &Arc<Slot<L>>) {
        let mut slots = self.slots.lock();
        if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.shift_remove(key);
        }
    }

    /// Evict least recently used settled slots until at most `capacity`
    /// remain. Locked slots are skipped.
    fn enforce_capacity(&self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let mut slots = self.slots.lock();
        let mut settled = slots.values().filter(|slot| slot.is_settled()).count();
        let mut index = 0;
        while settled > capacity.get() && index < slots.len() {
            let evictable = {
                let slot = &slots[index];
                slot.is_settled() && slot.state.try_lock().is_some()
            };
            if !evictable {
                index += 1;
                continue;
            }
            if let Some((evicted, _)) = slots.shift_remove_index(index) {
                tracing::debug!("evicted: {evicted}");
            }
            settled -= 1;
        }
    }

    fn touch(slots: &mut IndexMap<String, Arc<Slot<L>>>, index: usize) -> Arc<Slot<L>> {
        let last = slots.len() - 1;
        slots.move_index(index, last);
        Arc::clone(&slots[last])
    }
}
