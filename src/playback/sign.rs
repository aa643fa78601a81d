use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback errors. Recoverable; the sequencer keeps its current settings.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A playback rate outside the supported set was requested.
    #[error("unsupported playback speed: {0}x")]
    UnsupportedSpeed(f64),
}

/// Closed set of animation categories driving the avatar's motion.
///
/// The vocabulary mirrors the translation service's sign dictionary. An
/// unrecognized value deserializes to the default `PointForward` rather than
/// failing, so a newer backend vocabulary never breaks playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Wave,
    ThumbsUp,
    ThumbsDown,
    Nod,
    Shake,
    Fingerspell,
    FlatHandToChin,
    CircleChest,
    BookToHead,
    Lightbulb,
    IndexFingerCurve,
    #[default]
    #[serde(other)]
    PointForward,
}

/// One discrete unit in a translated gesture sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sign {
    pub word: String,
    pub gesture: Gesture,
    pub description: String,
}

/// Read-only ordered list of signs, immutable for the lifetime of a
/// play-through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignSequence(Vec<Sign>);

impl SignSequence {
    pub fn new(signs: Vec<Sign>) -> Self {
        Self(signs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sign> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sign> {
        self.0.iter()
    }
}

impl From<Vec<Sign>> for SignSequence {
    fn from(signs: Vec<Sign>) -> Self {
        Self(signs)
    }
}

/// Translation result as returned by the backend: the source text plus its
/// ordered sign list. Extra backend fields (per-sign timing, avatar
/// instructions) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AslTranslation {
    #[serde(default)]
    pub original_text: String,
    pub signs: SignSequence,
}

/// Supported playback-rate multipliers.
///
/// The set is closed: rates outside it are rejected with
/// [`PlaybackError::UnsupportedSpeed`], never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// 0.5x
    Half,
    /// 1x
    #[default]
    Normal,
    /// 1.5x
    OneAndHalf,
    /// 2x
    Double,
}

impl PlaybackSpeed {
    /// Multiplier applied to the base per-sign duration.
    pub fn factor(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = PlaybackError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // The supported factors are exactly representable, so equality is safe.
        if value == 0.5 {
            Ok(PlaybackSpeed::Half)
        } else if value == 1.0 {
            Ok(PlaybackSpeed::Normal)
        } else if value == 1.5 {
            Ok(PlaybackSpeed::OneAndHalf)
        } else if value == 2.0 {
            Ok(PlaybackSpeed::Double)
        } else {
            Err(PlaybackError::UnsupportedSpeed(value))
        }
    }
}
