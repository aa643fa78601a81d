use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::sequencer::{Advance, Sequencer};
use super::sign::{PlaybackSpeed, Sign, SignSequence};

/// Observational events emitted to the presentation layer. Emission never
/// affects sequencer state.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The timeline moved; the sign at `index` is now current.
    Sign { index: usize, sign: Sign },
    /// The play-through completed; the position is back at the start and
    /// playback has halted.
    Finished,
}

#[derive(Debug)]
enum Command {
    Play,
    Pause,
    Reset,
    SetSpeed(PlaybackSpeed),
    Shutdown,
}

/// Handle to a running playback driver task.
///
/// Commands are applied in order by the driver. Dropping the handle shuts
/// the driver down.
pub struct PlayerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn play(&self) {
        let _ = self.cmd_tx.send(Command::Play);
    }

    pub fn pause(&self) {
        let _ = self.cmd_tx.send(Command::Pause);
    }

    pub fn reset(&self) {
        let _ = self.cmd_tx.send(Command::Reset);
    }

    /// Change the rate for future per-sign waits; an in-flight wait keeps
    /// its original deadline.
    pub fn set_speed(&self, speed: PlaybackSpeed) {
        let _ = self.cmd_tx.send(Command::SetSpeed(speed));
    }

    /// Stop the driver and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

/// Async driver for a [`Sequencer`].
pub struct Player;

impl Player {
    /// Spawn a driver task over the sequence.
    ///
    /// Returns the control handle and the event stream for the presentation
    /// layer. Playback starts paused at index 0; call
    /// [`PlayerHandle::play`].
    pub fn spawn(
        sequence: SignSequence,
        speed: PlaybackSpeed,
    ) -> (PlayerHandle, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sequencer = Sequencer::new(sequence, speed);
        let task = tokio::spawn(run(sequencer, cmd_rx, event_tx));

        (PlayerHandle { cmd_tx, task }, event_rx)
    }
}

async fn run(
    mut sequencer: Sequencer,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) {
    info!(signs = sequencer.sequence().len(), "playback driver started");

    // Deadline of the pending advance, if one is armed. Commands other than
    // play/pause/reset leave it untouched, so a speed change never alters an
    // in-flight wait.
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(Command::Shutdown) => break,
                    Some(Command::Play) => {
                        if sequencer.play() {
                            deadline = Some(Instant::now() + sequencer.delay());
                            debug!(index = sequencer.index(), "playback started");
                        }
                    }
                    Some(Command::Pause) => {
                        sequencer.pause();
                        deadline = None;
                    }
                    Some(Command::Reset) => {
                        sequencer.reset();
                        deadline = None;
                    }
                    Some(Command::SetSpeed(speed)) => sequencer.set_speed(speed),
                }
            }
            _ = wait_until(deadline) => {
                match sequencer.advance() {
                    Advance::Moved(index) => {
                        if let Some(sign) = sequencer.current() {
                            let _ = events.send(PlaybackEvent::Sign {
                                index,
                                sign: sign.clone(),
                            });
                        }
                        deadline = Some(Instant::now() + sequencer.delay());
                    }
                    Advance::Finished => {
                        let _ = events.send(PlaybackEvent::Finished);
                        deadline = None;
                        debug!("play-through finished");
                    }
                }
            }
        }
    }

    info!("playback driver stopped");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
