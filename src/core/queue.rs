//! Bounded-feel FIFO control-message queue
//!
//! Messages are never actually dropped once accepted — "bounded" here means
//! the producer side tracks depth and reports two thresholds
//! (`SOFT_QUEUE_THRESHOLD`/`HARD_QUEUE_THRESHOLD`) so a façade can mirror
//! WebCodecs' `encodeQueueSize`/`decodeQueueSize` and refuse new work once
//! saturated, rather than growing the queue without bound.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

use super::{SOFT_QUEUE_THRESHOLD, HARD_QUEUE_THRESHOLD};

/// Depth-based admission state, mirrored from the producer side without a
/// round-trip through the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Below the soft threshold; business as usual
    Open,
    /// At or above the soft threshold; `dequeue` events should start firing
    /// once depth drops back below it
    Saturated,
    /// At or above the hard threshold; the producer must refuse new work
    /// with `QuotaExceededError` instead of enqueuing
    Full,
}

/// Producer-visible handle to a worker's inbound message queue.
///
/// Cloning is cheap (an `Arc` around the depth counter plus a cloned
/// `crossbeam` sender) so multiple host-thread call sites (e.g. concurrent
/// `encode()`/`flush()` invocations racing on the event loop) can enqueue
/// without additional locking.
pub struct ControlQueue<M> {
    sender: Sender<M>,
    // Kept alongside the sender so `clear()` can drain pending messages
    // synchronously from the producer side (crossbeam channels are MPMC;
    // racing the worker's own `recv()` for the same messages is harmless,
    // since each message is delivered to exactly one side and either way
    // it's discarded rather than acted on twice).
    receiver: Receiver<M>,
    depth: Arc<AtomicUsize>,
    sealed: Arc<AtomicBool>,
}

impl<M> Clone for ControlQueue<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            depth: Arc::clone(&self.depth),
            sealed: Arc::clone(&self.sealed),
        }
    }
}

impl<M> ControlQueue<M> {
    /// Create a linked producer/consumer pair. The consumer side
    /// (`QueueConsumer`) is handed to the worker thread.
    pub fn new() -> (Self, QueueConsumer<M>) {
        let (sender, receiver) = channel::unbounded();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            Self {
                sender,
                receiver: receiver.clone(),
                depth: Arc::clone(&depth),
                sealed: Arc::new(AtomicBool::new(false)),
            },
            QueueConsumer { receiver, depth },
        )
    }

    /// Current queue depth, as seen by the producer. Used directly for
    /// `encodeQueueSize`/`decodeQueueSize`.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Admission state at the current depth.
    pub fn state(&self) -> QueueState {
        let depth = self.depth();
        if depth >= HARD_QUEUE_THRESHOLD {
            QueueState::Full
        } else if depth >= SOFT_QUEUE_THRESHOLD {
            QueueState::Saturated
        } else {
            QueueState::Open
        }
    }

    /// Enqueue a message, incrementing the depth counter. Returns `false`
    /// without enqueuing if the queue has been `seal()`ed — callers (namely
    /// `close()`) still want their own terminal message delivered, so they
    /// bypass `push` and go through `force_push` instead.
    ///
    /// The caller is responsible for checking `state()` first if it needs
    /// to reject work at the hard threshold — `push` itself never refuses
    /// for that reason, since Reset/Close must always be able to enqueue
    /// even when the encode/decode queue is full.
    pub fn push(&self, message: M) -> bool {
        if self.sealed.load(Ordering::Acquire) {
            return false;
        }
        self.depth.fetch_add(1, Ordering::AcqRel);
        let _ = self.sender.send(message);
        true
    }

    /// Enqueue regardless of seal state. Used by `close()` to hand the
    /// worker its final message after `seal()` has already been called.
    pub fn force_push(&self, message: M) {
        self.depth.fetch_add(1, Ordering::AcqRel);
        let _ = self.sender.send(message);
    }

    /// Discard all messages currently queued, without waiting for the
    /// worker to consume them. Used by `reset()` so the façade's observable
    /// state flips to `unconfigured` immediately even if the worker is
    /// still busy with earlier work.
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Idempotent. Subsequent `push` calls are refused; the worker keeps
    /// draining whatever is already queued (plus anything sent via
    /// `force_push`) until it is told to stop.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

/// Worker-side consumer half of a `ControlQueue`.
pub struct QueueConsumer<M> {
    receiver: Receiver<M>,
    depth: Arc<AtomicUsize>,
}

impl<M> QueueConsumer<M> {
    /// Block until a message is available or the queue is closed (all
    /// producer handles dropped).
    pub fn recv(&self) -> Option<M> {
        match self.receiver.recv() {
            Ok(message) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                Some(message)
            }
            Err(_) => None,
        }
    }

    /// Non-blocking poll, for a worker that also needs to service other
    /// wakeups (not used by the current single-purpose workers, kept for
    /// symmetry with `recv`).
    pub fn try_recv(&self) -> Option<M> {
        match self.receiver.try_recv() {
            Ok(message) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                Some(message)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Depth right now, as seen by the worker after a dequeue. Used to
    /// compute whether a just-processed message carried the queue back
    /// below the soft threshold (a `dequeue` event).
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_ordering_preserved() {
        let (queue, consumer) = ControlQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        let drained: Vec<_> = (0..5).map(|_| consumer.recv().unwrap()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn depth_tracks_push_and_recv() {
        let (queue, consumer) = ControlQueue::new();
        assert_eq!(queue.depth(), 0);
        queue.push(());
        queue.push(());
        assert_eq!(queue.depth(), 2);
        consumer.recv();
        assert_eq!(queue.depth(), 1);
    }

    #[test]
    fn thresholds_report_saturation() {
        let (queue, _consumer) = ControlQueue::new();
        for _ in 0..SOFT_QUEUE_THRESHOLD {
            queue.push(());
        }
        assert_eq!(queue.state(), QueueState::Saturated);
        for _ in SOFT_QUEUE_THRESHOLD..HARD_QUEUE_THRESHOLD {
            queue.push(());
        }
        assert_eq!(queue.state(), QueueState::Full);
    }

    #[test]
    fn recv_returns_none_once_producer_dropped() {
        let (queue, consumer) = ControlQueue::<()>::new();
        drop(queue);
        assert!(consumer.recv().is_none());
    }

    #[test]
    fn clear_discards_pending_messages_synchronously() {
        let (queue, consumer) = ControlQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        queue.clear();
        assert_eq!(queue.depth(), 0);
        queue.push(99);
        assert_eq!(consumer.recv(), Some(99));
    }

    #[test]
    fn seal_refuses_push_but_force_push_still_delivers() {
        let (queue, consumer) = ControlQueue::new();
        queue.seal();
        assert!(!queue.push(1));
        assert_eq!(queue.depth(), 0);
        queue.force_push(2);
        assert_eq!(consumer.recv(), Some(2));
    }
}
