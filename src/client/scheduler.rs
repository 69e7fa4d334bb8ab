//! Keyed debounce.
//!
//! Provides:
//! - `Debouncer` - Collapses bursts of calls per key into one delayed firing

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crossbeam::channel::Sender;

/// Timer expiry delivered to the owning loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired<K> {
    pub key: K,
    generation: u64,
}

struct Pending<P> {
    payload: P,
    generation: u64,
}

/// Trailing-edge debounce with at most one pending firing per key.
///
/// Scheduling a key that is already pending replaces its payload and restarts
/// the window; only the latest payload survives. Timers run on short-lived
/// threads and report back over `timer_tx`; the owner passes each report to
/// [`Debouncer::fire`], which ignores firings superseded by a later schedule
/// or a cancel.
pub struct Debouncer<K, P> {
    pending: HashMap<K, Pending<P>>,
    delay: Duration,
    next_generation: u64,
    timer_tx: Sender<TimerFired<K>>,
}

impl<K, P> Debouncer<K, P>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(timer_tx: Sender<TimerFired<K>>, delay: Duration) -> Self {
        Debouncer {
            pending: HashMap::new(),
            delay,
            next_generation: 0,
            timer_tx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule (or reschedule) `key` with `payload`.
    pub fn schedule(&mut self, key: K, payload: P) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(
            key.clone(),
            Pending {
                payload,
                generation,
            },
        );

        let tx = self.timer_tx.clone();
        let delay = self.delay;
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            // Ignore send errors - the owner may have shut down.
            let _ = tx.send(TimerFired { key, generation });
        });
    }

    /// Take the payload for a timer report, if it is still the live one.
    pub fn fire(&mut self, fired: TimerFired<K>) -> Option<P> {
        match self.pending.get(&fired.key) {
            Some(pending) if pending.generation == fired.generation => {}
            _ => return None,
        }
        self.pending.remove(&fired.key).map(|pending| pending.payload)
    }

    pub fn cancel(&mut self, key: &K) {
        self.pending.remove(key);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
