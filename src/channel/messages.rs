use serde::{Deserialize, Serialize};

use crate::playback::AslTranslation;

/// Lifecycle kinds dispatched through the same handler registry as
/// application-level kinds.
pub const KIND_CONNECTED: &str = "connected";
pub const KIND_DISCONNECTED: &str = "disconnected";
pub const KIND_ERROR: &str = "error";

/// Server-push kinds used by the learning-assistant backend.
pub const KIND_PROCESSING: &str = "processing";
pub const KIND_ASL_TRANSLATION: &str = "asl_translation";

/// Client-to-server kinds.
pub const KIND_AUDIO_CHUNK: &str = "audio_chunk";
pub const KIND_TEXT_INPUT: &str = "text_input";

/// One frame on the event channel: a mandatory kind discriminator plus an
/// arbitrary payload, flattened into a single JSON object on the wire
/// (`{"type": ..., ...payload}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

impl ChannelMessage {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Decode the payload into a typed shape.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Payload of a `processing` push: a human-readable status line while the
/// backend works on submitted audio or text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingUpdate {
    pub message: String,
}

/// Payload of an `asl_translation` push carrying a finished translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AslTranslationPush {
    pub data: AslTranslation,
}

/// Payload of a `text_input` frame sent to the backend for translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
}

/// Payload of an `audio_chunk` frame: one base64-encoded capture fragment.
/// Encoding is the producer's concern; this crate relays the string as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChunkUpload {
    pub data: String,
}
