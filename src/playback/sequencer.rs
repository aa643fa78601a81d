use std::time::Duration;
use tracing::debug;

use super::sign::{PlaybackSpeed, Sign, SignSequence};

/// Base duration a sign is shown for at 1x speed.
pub const BASE_SIGN_DURATION: Duration = Duration::from_millis(1500);

/// Outcome of one advance-timer fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given index; the sign there is now current.
    Moved(usize),
    /// The last sign had been shown: playback halted and the position reset
    /// to the start. The sequence does not loop.
    Finished,
}

/// Discrete playback timeline over an immutable sign sequence.
///
/// Pure state machine: transitions mutate `index`/`playing`/`speed` and
/// nothing else. The async driver ([`super::Player`]) owns the actual timer
/// and applies `advance` on each fire, so at most one advance is pending
/// while playing.
#[derive(Debug)]
pub struct Sequencer {
    sequence: SignSequence,
    index: usize,
    playing: bool,
    speed: PlaybackSpeed,
}

impl Sequencer {
    pub fn new(sequence: SignSequence, speed: PlaybackSpeed) -> Self {
        Self {
            sequence,
            index: 0,
            playing: false,
            speed,
        }
    }

    /// Begin (or resume) playing.
    ///
    /// Returns `true` when a new advance timer should be armed. A no-op on
    /// an empty sequence or when already playing.
    pub fn play(&mut self) -> bool {
        if self.sequence.is_empty() || self.playing {
            return false;
        }
        self.playing = true;
        true
    }

    /// Stop advancing, preserving the current position.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stop and return to the start of the sequence.
    pub fn reset(&mut self) {
        self.playing = false;
        self.index = 0;
    }

    /// Change the rate for future waits. An in-flight wait is unaffected.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        debug!(factor = speed.factor(), "playback speed changed");
        self.speed = speed;
    }

    /// Apply one timer fire: move to the next sign, or halt at the start
    /// when the last sign has been shown.
    pub fn advance(&mut self) -> Advance {
        if !self.playing || self.sequence.is_empty() {
            return Advance::Finished;
        }

        if self.index + 1 < self.sequence.len() {
            self.index += 1;
            Advance::Moved(self.index)
        } else {
            self.playing = false;
            self.index = 0;
            Advance::Finished
        }
    }

    /// Wait before the next advance: base duration scaled by the speed.
    pub fn delay(&self) -> Duration {
        BASE_SIGN_DURATION.div_f64(self.speed.factor())
    }

    pub fn current(&self) -> Option<&Sign> {
        self.sequence.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn sequence(&self) -> &SignSequence {
        &self.sequence
    }
}
