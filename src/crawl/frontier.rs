// src/crawl/frontier.rs
// =============================================================================
// The frontier: which URLs have been admitted, and the queue of pages still
// to fetch.
//
// How it works:
// 1. try_admit() refuses anything deeper than max_depth
// 2. It inserts the normalized URL into a sharded concurrent set. Exactly one
//    caller sees the insert succeed, so exactly one caller "wins" a URL
// 3. The winner's task goes onto a bounded queue. If the queue is full the
//    task is dropped (and stays visited): we shed load instead of blocking
//
// Termination:
// `outstanding` counts tasks that are queued or being processed. A worker
// admits the links it discovers *before* it reports its own task finished,
// so the count can only reach zero when nothing is queued, nothing is in
// flight, and nothing more can ever be produced.
//
// Rust concepts:
// - DashSet: a HashSet split into shards, each behind its own lock, so many
//   workers can insert at once. insert() returns false if it was already there
// - Atomics: lock-free counters shared between threads
// - tokio::sync::Notify: wakes a task that is waiting for "drained"
// - mpsc channel: bounded queue with one sender side and one receiver side
// =============================================================================

use dashmap::DashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    pub url: Url,
    pub depth: usize,
}

// Counters describing what the frontier did during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    /// try_admit() calls that returned true
    pub admitted: usize,
    /// admitted tasks that made it onto the queue
    pub queued: usize,
    /// admitted tasks shed because the queue was full or closed
    pub dropped: usize,
}

pub struct Frontier {
    max_depth: usize,
    // Normalized URL strings of everything ever admitted this run
    visited: DashSet<String>,
    sender: mpsc::Sender<PageTask>,
    // Tasks queued or being processed right now
    outstanding: AtomicUsize,
    drained: Notify,
    // Report counters only; nothing decides anything based on them
    admitted: AtomicUsize,
    queued: AtomicUsize,
    dropped: AtomicUsize,
}

// The consuming side of the frontier queue, shared by all workers
//
// An mpsc Receiver has exactly one owner, so the workers take turns through
// a Mutex. The lock is only held while waiting for the next task, never
// while a page is processed.
pub struct TaskQueue {
    receiver: Mutex<mpsc::Receiver<PageTask>>,
}

impl Frontier {
    // Creates a frontier and the queue its tasks are pulled from
    pub fn new(max_depth: usize, capacity: usize) -> (Self, TaskQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let frontier = Self {
            max_depth,
            visited: DashSet::new(),
            sender,
            outstanding: AtomicUsize::new(0),
            drained: Notify::new(),
            admitted: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        };
        let queue = TaskQueue {
            receiver: Mutex::new(receiver),
        };
        (frontier, queue)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    // Admits a URL at most once per run
    //
    // Returns true only to the single caller whose insert into the visited
    // set succeeded, even if that task was then dropped because the queue
    // was full.
    pub fn try_admit(&self, url: &Url, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let url = normalize(url);
        // The check and the insert are one atomic step: of several workers
        // racing on the same URL, exactly one gets `true` back
        if !self.visited.insert(url.as_str().to_owned()) {
            return false;
        }

        self.admitted.fetch_add(1, Ordering::Relaxed);
        // Counted *before* it hits the queue, so a worker that picks it up and
        // finishes immediately can't push the count below zero
        self.outstanding.fetch_add(1, Ordering::AcqRel);

        // try_send never waits. A worker blocked here on a full queue would
        // stop draining that same queue, and enough of them would deadlock
        match self.sender.try_send(PageTask { url, depth }) {
            Ok(()) => {
                self.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(task)) => {
                warn!(url = %task.url, depth = task.depth, "Queue full, skipping");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.finish_task();
            }
            Err(TrySendError::Closed(task)) => {
                debug!(url = %task.url, "Queue closed, skipping");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.finish_task();
            }
        }
        true
    }

    // Marks one admitted task as done (processed, dropped, or abandoned)
    pub fn finish_task(&self) {
        // fetch_sub returns the value *before* subtracting: 1 means we just
        // took it to 0
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            // notify_one stores a permit, so a waiter that shows up late
            // still wakes
            self.drained.notify_one();
        }
    }

    // Resolves once no task is queued or in flight
    pub async fn wait_drained(&self) {
        loop {
            // Create the Notified future before reading the counter, so a
            // notify that lands between the load and the await isn't missed
            let notified = self.drained.notified();
            if self.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl TaskQueue {
    // Next task, or None once the run is cancelled or the queue is closed
    pub async fn next(&self, cancel: &CancellationToken) -> Option<PageTask> {
        tokio::select! {
            // `biased`: check cancellation first on every poll. Without it
            // select! picks a random ready branch, and a cancelled run could
            // keep pulling tasks off a non-empty queue
            biased;
            _ = cancel.cancelled() => None,
            task = async { self.receiver.lock().await.recv().await } => task,
        }
    }
}

// Fragments never change what the server sends back
fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Ordering::Relaxed for some counters but AcqRel for `outstanding`?
//    - Relaxed only guarantees the number itself is right
//    - `outstanding` decides when the run is over, so its updates must also
//      be ordered with the work around them (the admits before a finish)
//
// 2. Why does try_admit() return true for a dropped task?
//    - "true" means "you won this URL". The URL counts as visited either way,
//      so nobody else will try it again this run
//
// 3. What is a Notify "permit"?
//    - notify_one() with nobody waiting stores one permit
//    - The next notified().await consumes it and returns right away
//    - That is how a late waiter still hears about an earlier "drained"
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_admits_once() {
        let (frontier, _queue) = Frontier::new(2, 10);
        assert!(frontier.try_admit(&url("https://example.com/a"), 0));
        assert!(!frontier.try_admit(&url("https://example.com/a"), 1));
        assert_eq!(frontier.stats().admitted, 1);
    }

    #[test]
    fn test_fragments_collapse_to_one_visit() {
        let (frontier, _queue) = Frontier::new(2, 10);
        assert!(frontier.try_admit(&url("https://example.com/a#intro"), 1));
        assert!(!frontier.try_admit(&url("https://example.com/a#usage"), 1));
    }

    #[test]
    fn test_too_deep_is_refused_without_side_effects() {
        let (frontier, _queue) = Frontier::new(1, 10);
        assert!(!frontier.try_admit(&url("https://example.com/deep"), 2));
        assert_eq!(frontier.stats(), FrontierStats::default());
        // Refusal didn't mark it visited
        assert!(frontier.try_admit(&url("https://example.com/deep"), 1));
    }

    #[test]
    fn test_full_queue_drops_but_stays_visited() {
        let (frontier, _queue) = Frontier::new(3, 1);
        assert!(frontier.try_admit(&url("https://example.com/1"), 1));
        assert!(frontier.try_admit(&url("https://example.com/2"), 1));
        assert!(!frontier.try_admit(&url("https://example.com/2"), 1));

        let stats = frontier.stats();
        assert_eq!(stats.admitted, 2);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_has_one_winner() {
        let (frontier, _queue) = Frontier::new(2, 1000);
        let frontier = Arc::new(frontier);
        let target = url("https://example.com/shared");

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                let target = target.clone();
                tokio::spawn(async move { frontier.try_admit(&target, 1) })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(frontier.stats().queued, 1);
    }

    #[tokio::test]
    async fn test_drains_after_every_task_finishes() {
        let (frontier, queue) = Frontier::new(2, 10);
        let cancel = CancellationToken::new();
        frontier.try_admit(&url("https://example.com/"), 0);

        let task = queue.next(&cancel).await.unwrap();
        assert_eq!(task.depth, 0);

        // A discovered link keeps the frontier busy after the parent finishes
        frontier.try_admit(&url("https://example.com/child"), 1);
        frontier.finish_task();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), frontier.wait_drained())
                .await
                .is_err()
        );

        queue.next(&cancel).await.unwrap();
        frontier.finish_task();
        tokio::time::timeout(Duration::from_secs(1), frontier.wait_drained())
            .await
            .expect("frontier should drain");
    }

    #[tokio::test]
    async fn test_cancelled_queue_yields_nothing() {
        let (frontier, queue) = Frontier::new(2, 10);
        frontier.try_admit(&url("https://example.com/"), 0);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(queue.next(&cancel).await.is_none());
    }
}
