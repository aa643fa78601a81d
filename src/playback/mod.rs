pub mod player;
pub mod sequencer;
pub mod sign;

pub use player::{PlaybackEvent, Player, PlayerHandle};
pub use sequencer::{Advance, Sequencer, BASE_SIGN_DURATION};
pub use sign::{AslTranslation, Gesture, PlaybackError, PlaybackSpeed, Sign, SignSequence};
