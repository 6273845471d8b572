//! Per-codec worker-owned execution engine
//!
//! The pieces here are the non-negotiable core described by this crate's
//! specification: a control-message queue with depth-based admission
//! (`queue`), a dedicated worker thread per codec instance that owns the
//! underlying codec context exclusively (`worker`), and a callback delivery
//! path that cannot reach into a torn-down host environment (`gateway`).
//! The four façades (`VideoEncoder`, `VideoDecoder`, `AudioEncoder`,
//! `AudioDecoder`) are built on top of these three primitives instead of the
//! synchronous `Arc<Mutex<Inner>>` + output-queue pattern they used before:
//! each owns a `ControlQueue<Message>`, spawns exactly one `CodecWorker` over
//! a role implementing `WorkerRole`, and delivers results through one or
//! more `SafeCallbackGateway`s.

pub mod gateway;
pub mod queue;
pub mod worker;

pub use gateway::SafeCallbackGateway;
pub use queue::{ControlQueue, QueueConsumer, QueueState};
pub use worker::{CodecWorker, WorkerRole};

/// Queue depth at which a façade should report saturation
/// (`encodeQueueSize`/`decodeQueueSize` crossing into "busy") and start
/// emitting `dequeue` events once depth falls back below it.
pub const SOFT_QUEUE_THRESHOLD: usize = 16;

/// Queue depth at which a façade must refuse new `encode()`/`decode()`
/// calls with `QuotaExceededError` rather than let the backlog grow
/// unbounded.
pub const HARD_QUEUE_THRESHOLD: usize = 64;
