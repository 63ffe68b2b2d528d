//! Camera stream sources.
//!
//! The transport behind a stream (RTSP reconnects, HTTP polling, device
//! handles) is outside this crate; the orchestrator only consumes the
//! `CameraStream` contract. Read failures are transient - the orchestrator
//! retries them, implementations should not retry internally.

mod synthetic;

pub use synthetic::SyntheticCamera;

use anyhow::Result;

use crate::frame::Frame;

/// A live video source feeding one pipeline instance.
pub trait CameraStream {
    /// Stable identifier used for event attribution and dedup keying.
    fn camera_id(&self) -> &str;

    /// Acquire the stream resource. Failure here is fatal to the pipeline.
    fn connect(&mut self) -> Result<()>;

    /// Read the next frame. `Ok(None)` means no frame was available right
    /// now; the caller decides how to retry. `Err` is a transient transport
    /// failure, also retried by the caller.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the stream resource. Idempotent.
    fn disconnect(&mut self);
}
