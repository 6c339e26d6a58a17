//! 🏭 Pipelines: where streams, workers, backends, and renderers finally meet.
//!
//! ```text
//! list-objects:  prefixes ─▶ sequence_source ─▶ Supervisor(k workers) ─▶ S3 pages ─▶ renderer ─▶ stdout
//! send-message:  input ─▶ line_source ─▶ batch_accumulator ─▶ Supervisor(k workers) ─▶ SQS batch
//! ```
//!
//! Each pipeline is a `WorkHandler` (what one worker does with one unit) plus a
//! `run` function that wires the stream, validates config, and waits for the pool.

pub(crate) mod list_objects;
pub(crate) mod send_message;

pub use list_objects::ListObjectsOptions;
pub use send_message::SendMessageOptions;
