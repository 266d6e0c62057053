//! Per-key bookkeeping of in-flight calls.
//!
//! The registry holds at most one live call per [`RequestKey`]. Every tracked
//! call is tagged with a generation number; when a call settles, the
//! coordinator asks the registry whether that generation is still the
//! current one for its key. Completions of replaced or cancelled calls are
//! recognized as stale this way, even when the transport could not abort the
//! network operation in time.

use crate::http::CancelSignal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use super_api_core::RequestKey;
use tokio::sync::watch;

/// How a tracked call ended up when it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Still the registered call for its key; its outcome applies
    Current,
    /// Aborted by an explicit cancel; report it as a failed call
    Cancelled,
    /// Replaced by a newer call or reset; discard the outcome
    Stale,
}

/// Handle of one tracked call.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    key: RequestKey,
    generation: u64,
    signal: CancelSignal,
}

impl CancelHandle {
    /// Key the call is tracked under
    #[must_use]
    pub const fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Generation tag of the call
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal that fires when the call is cancelled
    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        self.signal.clone()
    }
}

#[derive(Debug)]
struct Tracked {
    generation: u64,
    trigger: watch::Sender<bool>,
}

#[derive(Debug, Default)]
struct Slots {
    live: HashMap<RequestKey, Tracked>,
    cancelled: HashMap<RequestKey, u64>,
}

/// Registry of in-flight calls, one per key.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    slots: Mutex<Slots>,
    next_generation: AtomicU64,
    cancellations: AtomicU64,
}

impl CancellationRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a new call for `key`.
    ///
    /// Replaces any existing handle without cancelling it; callers that want
    /// abort-on-supersede call [`cancel`](Self::cancel) first.
    pub fn begin_tracking(&self, key: RequestKey) -> CancelHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (trigger, signal) = CancelSignal::channel();

        let mut slots = self.slots();
        slots.cancelled.remove(&key);
        slots.live.insert(key.clone(), Tracked { generation, trigger });

        CancelHandle {
            key,
            generation,
            signal,
        }
    }

    /// Abort the call tracked for `key` and track a new one in its place.
    ///
    /// Both happen under one lock, so two calls racing for the same key can
    /// never both miss each other: whichever registers second aborts the
    /// first. Returns whether a call was aborted, with the new handle.
    pub fn supersede(&self, key: RequestKey) -> (bool, CancelHandle) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (trigger, signal) = CancelSignal::channel();

        let displaced = {
            let mut slots = self.slots();
            slots.cancelled.remove(&key);
            slots.live.insert(key.clone(), Tracked { generation, trigger })
        };
        let aborted = displaced.is_some_and(|tracked| self.fire(&key, &tracked));

        (
            aborted,
            CancelHandle {
                key,
                generation,
                signal,
            },
        )
    }

    /// Abort the call tracked for `key`. Returns whether one was tracked.
    ///
    /// The aborted call settles as [`Settlement::Stale`].
    pub fn cancel(&self, key: &RequestKey) -> bool {
        let removed = self.slots().live.remove(key);
        removed.is_some_and(|tracked| self.fire(key, &tracked))
    }

    /// Abort the call tracked for `key` and remember it, so that it settles
    /// as [`Settlement::Cancelled`] rather than silently.
    pub fn cancel_explicit(&self, key: &RequestKey) -> bool {
        let removed = {
            let mut slots = self.slots();
            let removed = slots.live.remove(key);
            if let Some(tracked) = &removed {
                slots.cancelled.insert(key.clone(), tracked.generation);
            }
            removed
        };
        removed.is_some_and(|tracked| self.fire(key, &tracked))
    }

    fn fire(&self, key: &RequestKey, tracked: &Tracked) -> bool {
        tracked.trigger.send_replace(true);
        self.cancellations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, generation = tracked.generation, "Cancelled in-flight call");
        true
    }

    /// Whether a call is in flight for `key`
    #[must_use]
    pub fn is_pending(&self, key: &RequestKey) -> bool {
        self.slots().live.contains_key(key)
    }

    /// Record that the call `generation` for `key` has settled.
    ///
    /// Removes the call from the registry when it is still current.
    pub fn settle(&self, key: &RequestKey, generation: u64) -> Settlement {
        let mut slots = self.slots();
        if slots.live.get(key).is_some_and(|t| t.generation == generation) {
            slots.live.remove(key);
            return Settlement::Current;
        }
        if slots.cancelled.get(key) == Some(&generation) {
            slots.cancelled.remove(key);
            return Settlement::Cancelled;
        }
        Settlement::Stale
    }

    /// Forget the call `generation` for `key` without firing its signal.
    ///
    /// Used when the caller stops waiting on a call before it settles.
    pub fn release(&self, key: &RequestKey, generation: u64) {
        let mut slots = self.slots();
        if slots.live.get(key).is_some_and(|t| t.generation == generation) {
            slots.live.remove(key);
        }
        if slots.cancelled.get(key) == Some(&generation) {
            slots.cancelled.remove(key);
        }
    }

    /// Number of calls in flight
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.slots().live.len()
    }

    /// Total number of calls aborted so far
    #[must_use]
    pub fn cancel_count(&self) -> u64 {
        self.cancellations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    fn key(k: &str) -> RequestKey {
        RequestKey::new(k)
    }

    #[test]
    fn test_cancel_without_tracking_is_noop() {
        let registry = CancellationRegistry::new();
        assert!(!registry.cancel(&key("a")));
        assert!(!registry.cancel_explicit(&key("a")));
        assert_eq!(registry.cancel_count(), 0);
    }

    #[test]
    fn test_begin_tracking_replaces_without_cancelling() {
        let registry = CancellationRegistry::new();
        let first = registry.begin_tracking(key("a"));
        let second = registry.begin_tracking(key("a"));

        assert!(!first.signal().is_cancelled());
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(registry.settle(&key("a"), first.generation()), Settlement::Stale);
        assert_eq!(registry.settle(&key("a"), second.generation()), Settlement::Current);
        assert!(!registry.is_pending(&key("a")));
    }

    #[test]
    fn test_cancel_fires_signal_and_makes_call_stale() {
        let registry = CancellationRegistry::new();
        let handle = registry.begin_tracking(key("a"));

        assert!(registry.is_pending(&key("a")));
        assert!(registry.cancel(&key("a")));
        assert!(handle.signal().is_cancelled());
        assert!(!registry.is_pending(&key("a")));
        assert_eq!(registry.settle(&key("a"), handle.generation()), Settlement::Stale);
    }

    #[test]
    fn test_explicit_cancel_settles_as_cancelled_once() {
        let registry = CancellationRegistry::new();
        let handle = registry.begin_tracking(key("a"));

        assert!(registry.cancel_explicit(&key("a")));
        assert_eq!(registry.settle(&key("a"), handle.generation()), Settlement::Cancelled);
        assert_eq!(registry.settle(&key("a"), handle.generation()), Settlement::Stale);
    }

    #[test]
    fn test_new_call_after_explicit_cancel_makes_old_one_stale() {
        let registry = CancellationRegistry::new();
        let old = registry.begin_tracking(key("a"));
        registry.cancel_explicit(&key("a"));
        let new = registry.begin_tracking(key("a"));

        assert_eq!(registry.settle(&key("a"), old.generation()), Settlement::Stale);
        assert_eq!(registry.settle(&key("a"), new.generation()), Settlement::Current);
    }

    #[test]
    fn test_keys_are_isolated() {
        let registry = CancellationRegistry::new();
        let a = registry.begin_tracking(key("A"));
        let b = registry.begin_tracking(key("B"));

        registry.cancel(&key("B"));

        assert!(!a.signal().is_cancelled());
        assert!(b.signal().is_cancelled());
        assert_eq!(registry.cancel_count(), 1);
        assert_eq!(registry.settle(&key("A"), a.generation()), Settlement::Current);
    }

    #[test]
    fn test_supersede_aborts_previous_call() {
        let registry = CancellationRegistry::new();
        let (aborted_first, first) = registry.supersede(key("a"));
        let (aborted_second, second) = registry.supersede(key("a"));

        assert!(!aborted_first);
        assert!(aborted_second);
        assert!(first.signal().is_cancelled());
        assert!(!second.signal().is_cancelled());
        assert_eq!(registry.cancel_count(), 1);
        assert_eq!(registry.settle(&key("a"), first.generation()), Settlement::Stale);
        assert_eq!(registry.settle(&key("a"), second.generation()), Settlement::Current);
    }

    #[test]
    fn test_concurrent_supersede_leaves_one_live_call() {
        let registry = std::sync::Arc::new(CancellationRegistry::new());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| registry.supersede(key("a")).1)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let handles: Vec<CancelHandle> = workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect();

        let live: Vec<_> = handles
            .iter()
            .filter(|handle| !handle.signal().is_cancelled())
            .collect();
        assert_eq!(live.len(), 1);
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(registry.cancel_count(), 799);
        assert_eq!(registry.settle(&key("a"), live[0].generation()), Settlement::Current);
    }

    #[test]
    fn test_release_forgets_only_matching_generation() {
        let registry = CancellationRegistry::new();
        let old = registry.begin_tracking(key("a"));
        let _new = registry.begin_tracking(key("a"));

        registry.release(&key("a"), old.generation());
        assert!(registry.is_pending(&key("a")));
    }
}
