use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by the capture subsystem.
///
/// All of these are recoverable: the controller stays in its prior state and
/// the caller can retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device acquisition was denied or failed. Nothing is left held.
    #[error("audio capture unavailable: {0}")]
    Unavailable(String),

    /// The controller is already recording; the live capture is untouched.
    #[error("recording already in progress")]
    AlreadyRecording,

    /// An uploaded artifact declared a non-audio content type.
    #[error("artifact is not audio (content type {0:?})")]
    InvalidArtifactType(String),
}

/// Constraints requested when acquiring the audio input device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// Capture sample rate in Hz
    pub sample_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            sample_rate: 44_100,
        }
    }
}

/// One time-sliced fragment of encoded audio delivered while the device is held.
#[derive(Debug, Clone, Default)]
pub struct AudioChunk {
    pub data: Vec<u8>,
}

impl AudioChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Audio input device abstraction.
///
/// The device is an exclusively-owned hardware resource: it is held between a
/// successful `acquire` and the matching `release`, and emits one encoded
/// chunk per capture interval (1s) into the returned channel while held.
/// Chunks are delivered in capture order. Dropping the sender (on release or
/// device-driven termination) ends delivery; the receiver drains whatever was
/// queued first.
///
/// Implementations must release a still-held device when dropped, so that
/// dropping the owning controller mid-recording gives back the hardware
/// without an explicit `release` call.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Acquire exclusive access to the input device.
    ///
    /// On failure nothing is held and no partial resource remains.
    async fn acquire(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Release the device and stop chunk delivery.
    ///
    /// Idempotent: releasing a device that is not held is a no-op.
    async fn release(&mut self) -> Result<(), CaptureError>;

    /// Whether the device is currently held.
    fn is_held(&self) -> bool;

    /// Device name for logging.
    fn name(&self) -> &str;
}
