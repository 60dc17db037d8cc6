// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-key write serialization
//!
//! The blob store only offers whole-object replace, with no compare-and-swap,
//! so all coordination for a key happens in-process, here.
//!
//! For every key the queue keeps the tail of a chain of completion signals.
//! Submitting a write swaps a fresh signal in as the new tail, synchronously,
//! at the moment the write is submitted. The write then waits for its
//! predecessor's signal, runs, and raises its own signal. Consequences:
//!
//! - writes to one key run one at a time, in submission order;
//! - a read captures the tail when it is submitted and waits for it, so it
//!   observes every write submitted before it and is never held up by a
//!   write submitted after it;
//! - different keys have independent chains and never wait on each other.
//!
//! A write's signal is raised from `Drop`, so a write that fails, panics, is
//! timed out or is cancelled by its caller still releases the key. A write
//! cancelled before its turn hands its signal to its predecessor, which
//! raises both when it completes, so the chain stays ordered without
//! spawning anything.

use diagnostics::*;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Completion signal of one write
#[derive(Debug)]
struct Completion {
    seq: u64,
    done: watch::Sender<bool>,
    /// Writes abandoned before their turn, which complete together with
    /// this one. `None` once this write has completed.
    successors: Mutex<Option<Vec<Arc<Completion>>>>,
}

impl Completion {
    fn new(seq: u64) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            seq,
            done,
            successors: Mutex::new(Some(Vec::new())),
        }
    }

    async fn wait(&self) {
        let mut done = self.done.subscribe();
        let _ = done.wait_for(|done| *done).await;
    }

    /// Arrange for `successor` to complete with this write
    ///
    /// Returns false if this write has already completed.
    fn hand_off(&self, successor: Arc<Completion>) -> bool {
        match lock(&self.successors).as_mut() {
            Some(successors) => {
                successors.push(successor);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    tails: HashMap<String, Arc<Completion>>,
    next_seq: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
}

impl Shared {
    /// Forget the tail for `key` if it is still the write numbered `seq`
    fn retire(&self, key: &str, seq: u64) {
        let mut state = lock(&self.state);
        if state.tails.get(key).is_some_and(|tail| tail.seq == seq) {
            let _ = state.tails.remove(key);
        }
    }

    /// Signal `completion` and every write handed off to it
    fn complete(&self, key: &str, completion: Arc<Completion>) {
        let mut pending = vec![completion];
        while let Some(completion) = pending.pop() {
            let successors = lock(&completion.successors).take().unwrap_or_default();
            self.retire(key, completion.seq);
            let _ = completion.done.send_replace(true);
            pending.extend(successors);
        }
    }
}

/// Serializes writes per storage key and orders reads behind them
///
/// Cloning is cheap and clones share state. Build one per process (or per
/// test) and hand it to everything that touches the same keys.
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    shared: Arc<Shared>,
}

/// A write's place in its key's chain
struct WriteTurn {
    shared: Arc<Shared>,
    key: String,
    completion: Arc<Completion>,
    predecessor: Option<Arc<Completion>>,
}

impl WriteTurn {
    async fn wait_for_predecessor(&mut self) {
        if let Some(prev) = self.predecessor.as_ref() {
            prev.wait().await;
        }
        self.predecessor = None;
    }
}

impl Drop for WriteTurn {
    fn drop(&mut self) {
        // Dropped before our turn came: complete only once the predecessor has
        if let Some(prev) = self.predecessor.take() {
            if prev.hand_off(self.completion.clone()) {
                return;
            }
        }
        self.shared.complete(&self.key, self.completion.clone());
    }
}

impl WriteQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next slot in `key`'s chain
    fn enqueue(&self, key: &str) -> WriteTurn {
        let mut state = lock(&self.shared.state);
        let seq = state.next_seq;
        state.next_seq += 1;
        let completion = Arc::new(Completion::new(seq));
        let predecessor = state.tails.insert(key.to_string(), completion.clone());
        drop(state);

        let queued_behind = predecessor.is_some();
        debug!(
            "queued write #{seq} for {key} (behind another: {queued_behind})",
            seq: seq,
            key: key,
            queued_behind: queued_behind
        );

        WriteTurn {
            shared: self.shared.clone(),
            key: key.to_string(),
            completion,
            predecessor,
        }
    }

    fn current_tail(&self, key: &str) -> Option<Arc<Completion>> {
        lock(&self.shared.state).tails.get(key).cloned()
    }

    /// Run `op` as the next write to `key`
    ///
    /// The write's position is fixed when this is called, not when the
    /// returned future is first polled. `op` runs only after every write
    /// submitted earlier for the same key has finished.
    pub fn write<F, Fut, T>(&self, key: &str, op: F) -> impl Future<Output = T> + use<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut turn = self.enqueue(key);
        async move {
            turn.wait_for_predecessor().await;
            let output = op().await;
            drop(turn);
            output
        }
    }

    /// Run a read-modify-write of `key` as a single write slot
    ///
    /// Nothing else queued on `key` can run between the read and the write
    /// inside `op`, so concurrent updaters never lose each other's changes.
    pub fn update<F, Fut, T>(&self, key: &str, op: F) -> impl Future<Output = T> + use<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.write(key, op)
    }

    /// Run `op` as a read of `key`
    ///
    /// Waits for every write to `key` submitted before this call; writes
    /// submitted afterwards do not delay it.
    pub fn read<F, Fut, T>(&self, key: &str, op: F) -> impl Future<Output = T> + use<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let pending = self.current_tail(key);
        async move {
            if let Some(pending) = pending {
                pending.wait().await;
            }
            op().await
        }
    }

    /// Queue a write and let it run in the background
    ///
    /// A failure is logged and does not affect later writes to the key. The
    /// returned handle yields the write's own result for callers that want it.
    pub fn submit_write<F, Fut, T, E>(&self, key: &str, op: F) -> JoinHandle<Result<T, E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let key = key.to_string();
        let write = self.write(&key, op);
        tokio::spawn(async move {
            let result = write.await;
            if let Err(e) = &result {
                let failure = e.to_string();
                error!("queued write to {key} failed: {failure}", key: key, failure: failure);
            }
            result
        })
    }

    /// Whether any write for `key` is queued or running
    #[must_use]
    pub fn is_write_pending(&self, key: &str) -> bool {
        lock(&self.shared.state).tails.contains_key(key)
    }

    /// Keys with queued or running writes, sorted
    #[must_use]
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.shared.state).tails.keys().cloned().collect();
        keys.sort();
        keys
    }
}
