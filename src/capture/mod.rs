pub mod accumulator;
pub mod device;
pub mod recorder;

pub use accumulator::{Artifact, ChunkAccumulator, ARTIFACT_CONTENT_TYPE};
pub use device::{AudioChunk, CaptureConstraints, CaptureDevice, CaptureError};
pub use recorder::{format_elapsed, CaptureState, RecorderStats, RecordingController};
