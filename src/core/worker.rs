//! Per-codec dedicated worker thread
//!
//! Each `VideoEncoder`/`VideoDecoder`/`AudioEncoder`/`AudioDecoder` instance
//! owns exactly one `CodecWorker`: a single background thread that is the
//! sole owner of the underlying `CodecContext` and drains its
//! `ControlQueue` strictly in FIFO order. Serializing all mutation through
//! one thread is what lets the façade hand out `Configure`/`Encode`/`Flush`/
//! `Reset`/`Close` messages from any host-thread call site without a mutex
//! around the codec itself — the only shared state is the queue.

use std::thread::{self, JoinHandle};

use super::queue::QueueConsumer;

/// Implemented once per codec role (video encoder, video decoder, audio
/// encoder, audio decoder). `handle_message` owns the codec context and any
/// role-specific scratch state (scaler, resampler, extradata-sent flag...);
/// it runs entirely on the worker thread.
pub trait WorkerRole: Send + 'static {
    type Message: Send + 'static;

    /// Process one message. `queue_depth` is the consumer-side depth
    /// immediately after this message was dequeued — roles that need to
    /// emit a `dequeue` notification (§4.2.2/§4.2.3) compare it against
    /// `queue_depth + 1` to detect a soft-threshold-to-below crossing
    /// without the queue needing to track that transition itself.
    ///
    /// Returning `false` stops the worker loop (used by the `Close`
    /// message to end the thread after it's been handled).
    fn handle_message(&mut self, message: Self::Message, queue_depth: usize) -> bool;
}

/// Owns a worker thread's `JoinHandle`. Dropping this without the thread
/// having already exited (i.e. without a prior `Close` message) blocks on
/// the queue disconnecting, since the worker's `recv()` returns `None` once
/// every `ControlQueue` producer handle referencing its consumer is
/// dropped — which happens when the façade itself is dropped.
pub struct CodecWorker {
    handle: Option<JoinHandle<()>>,
}

impl CodecWorker {
    /// Spawn the dedicated thread. `role` is moved onto the new thread;
    /// `consumer` is the worker-side half of the `ControlQueue` the façade
    /// keeps a producer handle to.
    pub fn spawn<R: WorkerRole>(mut role: R, consumer: QueueConsumer<R::Message>) -> Self {
        let handle = thread::Builder::new()
            .name("webcodec-worker".into())
            .spawn(move || {
                while let Some(message) = consumer.recv() {
                    if !role.handle_message(message, consumer.depth()) {
                        break;
                    }
                }
            })
            .expect("failed to spawn codec worker thread");

        Self {
            handle: Some(handle),
        }
    }

    /// Block until the worker thread has drained its queue and exited.
    /// Called from `close()`/`Drop`, never from the worker thread itself.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CodecWorker {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::ControlQueue;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingRole {
        seen: Arc<AtomicU32>,
    }

    enum TestMessage {
        Increment,
        Close,
    }

    impl WorkerRole for CountingRole {
        type Message = TestMessage;

        fn handle_message(&mut self, message: TestMessage, _queue_depth: usize) -> bool {
            match message {
                TestMessage::Increment => {
                    self.seen.fetch_add(1, Ordering::AcqRel);
                    true
                }
                TestMessage::Close => false,
            }
        }
    }

    #[test]
    fn worker_drains_queue_in_order_then_stops_on_close() {
        let seen = Arc::new(AtomicU32::new(0));
        let (queue, consumer) = ControlQueue::new();
        let mut worker = CodecWorker::spawn(
            CountingRole {
                seen: Arc::clone(&seen),
            },
            consumer,
        );

        for _ in 0..10 {
            queue.push(TestMessage::Increment);
        }
        queue.push(TestMessage::Close);
        drop(queue);

        worker.join();
        assert_eq!(seen.load(Ordering::Acquire), 10);
    }

    #[test]
    fn dropping_all_producers_ends_the_worker() {
        let seen = Arc::new(AtomicU32::new(0));
        let (queue, consumer) = ControlQueue::new();
        let mut worker = CodecWorker::spawn(CountingRole { seen }, consumer);
        drop(queue);
        worker.join();
    }
}
