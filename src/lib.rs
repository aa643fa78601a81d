pub mod backend;
pub mod capture;
pub mod channel;
pub mod config;
pub mod playback;

pub use backend::{BackendClient, TranscribeResponse};
pub use capture::{
    Artifact, AudioChunk, CaptureConstraints, CaptureDevice, CaptureError, CaptureState,
    ChunkAccumulator, RecorderStats, RecordingController,
};
pub use channel::{ChannelError, ChannelMessage, EventChannel, HandlerId, NatsTransport, Transport};
pub use config::Config;
pub use playback::{
    AslTranslation, Gesture, PlaybackError, PlaybackEvent, PlaybackSpeed, Player, PlayerHandle,
    Sequencer, Sign, SignSequence,
};
