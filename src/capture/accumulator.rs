use chrono::{DateTime, Utc};
use tracing::debug;

use super::device::{AudioChunk, CaptureError};

/// Content type stamped on artifacts assembled from captured chunks.
pub const ARTIFACT_CONTENT_TYPE: &str = "audio/webm";

/// A finalized binary audio object, produced by a recording or supplied by
/// upload. Opaque to this crate; it is handed to the transcription backend
/// as-is.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Wrap an externally supplied audio file, bypassing capture.
    ///
    /// The declared content type must be in the `audio/` category.
    pub fn from_upload(bytes: Vec<u8>, content_type: &str) -> Result<Self, CaptureError> {
        if !content_type.starts_with("audio/") {
            return Err(CaptureError::InvalidArtifactType(content_type.to_string()));
        }

        Ok(Self {
            bytes,
            content_type: content_type.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Buffers time-sliced chunks emitted during an active recording and
/// assembles them into a single artifact on stop.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    chunks: Vec<AudioChunk>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a captured chunk. Zero-length chunks are discarded.
    pub fn push(&mut self, chunk: AudioChunk) {
        if chunk.is_empty() {
            debug!("discarding empty capture chunk");
            return;
        }
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Concatenate all accumulated chunks into one artifact.
    ///
    /// Returns `None` when no non-empty chunk was captured.
    pub fn assemble(&self) -> Option<Artifact> {
        if self.chunks.is_empty() {
            return None;
        }

        let bytes: Vec<u8> = self
            .chunks
            .iter()
            .flat_map(|chunk| chunk.data.iter().copied())
            .collect();

        Some(Artifact {
            bytes,
            content_type: ARTIFACT_CONTENT_TYPE.to_string(),
            created_at: Utc::now(),
        })
    }
}
