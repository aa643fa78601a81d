use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::accumulator::{Artifact, ChunkAccumulator};
use super::device::{CaptureConstraints, CaptureDevice, CaptureError};

/// Recording state machine positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    Recording,
    Stopped,
}

/// Snapshot of a recording session's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderStats {
    pub state: CaptureState,
    pub elapsed_secs: u64,
    pub chunk_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    /// True when the device ended chunk delivery on its own while the state
    /// is still `Recording`; no further chunks will arrive and the caller
    /// should `stop()`.
    pub delivery_ended: bool,
}

/// Orchestrates the capture device, the chunk accumulator and an
/// elapsed-time counter behind a three-state machine.
///
/// The device handle is held if and only if the state is `Recording`, and is
/// released exactly once on every path that leaves `Recording`: explicit
/// `stop`, `reset`, and dropping the controller mid-recording (the
/// [`CaptureDevice`] contract releases a held device on drop). When the
/// device ends delivery on its own, [`RecorderStats::delivery_ended`] turns
/// true so the caller knows to `stop()`. A recording has no built-in
/// duration limit; it runs until stopped.
pub struct RecordingController {
    device: Box<dyn CaptureDevice>,
    constraints: CaptureConstraints,
    state: CaptureState,
    accumulator: Arc<Mutex<ChunkAccumulator>>,
    artifact: Option<Artifact>,
    elapsed_secs: Arc<AtomicU64>,
    started_at: Option<DateTime<Utc>>,
    pump_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
}

impl RecordingController {
    pub fn new(device: Box<dyn CaptureDevice>, constraints: CaptureConstraints) -> Self {
        Self {
            device,
            constraints,
            state: CaptureState::Idle,
            accumulator: Arc::new(Mutex::new(ChunkAccumulator::new())),
            artifact: None,
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            started_at: None,
            pump_task: None,
            ticker_task: None,
        }
    }

    /// Start a recording.
    ///
    /// Valid from `Idle` or `Stopped`: acquires the device, clears any
    /// previously accumulated chunks and artifact, zeroes the elapsed
    /// counter, and begins appending delivered chunks. On acquisition
    /// failure the prior state is unchanged and nothing is held.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == CaptureState::Recording {
            warn!("start() called while already recording");
            return Err(CaptureError::AlreadyRecording);
        }

        let mut chunk_rx = self.device.acquire(&self.constraints).await?;

        {
            let mut acc = self.accumulator.lock().await;
            acc.clear();
        }
        self.artifact = None;
        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.started_at = Some(Utc::now());

        // Pump delivered chunks into the accumulator until the device stops
        // delivery (release or device-driven termination).
        let accumulator = Arc::clone(&self.accumulator);
        self.pump_task = Some(tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                let mut acc = accumulator.lock().await;
                acc.push(chunk);
            }
            debug!("chunk delivery ended");
        }));

        // One increment per second while recording.
        let elapsed = Arc::clone(&self.elapsed_secs);
        self.ticker_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));

        self.state = CaptureState::Recording;
        info!(device = self.device.name(), "recording started");

        Ok(())
    }

    /// Stop the recording and assemble the artifact.
    ///
    /// Releases the device, which ends chunk delivery; every chunk queued at
    /// the time of the call is appended before the artifact is assembled.
    /// A no-op outside `Recording`.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            warn!(state = ?self.state, "stop() ignored outside Recording");
            return Ok(());
        }

        self.release_device().await;
        self.join_tasks().await;

        self.artifact = {
            let acc = self.accumulator.lock().await;
            acc.assemble()
        };
        self.state = CaptureState::Stopped;

        info!(
            elapsed_secs = self.elapsed_secs.load(Ordering::SeqCst),
            artifact_bytes = self.artifact.as_ref().map(Artifact::len).unwrap_or(0),
            "recording stopped"
        );

        Ok(())
    }

    /// Supply an externally uploaded audio file in place of a capture.
    ///
    /// The declared content type must be audio; on mismatch the state is
    /// unchanged. Rejected while a recording is live. Does not touch the
    /// elapsed counter.
    pub fn load_external_artifact(
        &mut self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CaptureError> {
        if self.state == CaptureState::Recording {
            return Err(CaptureError::AlreadyRecording);
        }

        let artifact = Artifact::from_upload(bytes, content_type)?;
        info!(
            content_type,
            bytes = artifact.len(),
            "external artifact loaded"
        );
        self.artifact = Some(artifact);
        self.state = CaptureState::Stopped;

        Ok(())
    }

    /// Return to `Idle`, discarding the artifact and any accumulated chunks.
    ///
    /// Safe from any state; afterwards the controller behaves exactly like a
    /// fresh one.
    pub async fn reset(&mut self) {
        self.release_device().await;
        self.join_tasks().await;

        {
            let mut acc = self.accumulator.lock().await;
            acc.clear();
        }
        self.artifact = None;
        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.started_at = None;
        self.state = CaptureState::Idle;

        debug!("recorder reset to idle");
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The finished artifact. `Some` iff the state is `Stopped` and at least
    /// one non-empty chunk was captured (or an upload was loaded).
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Take ownership of the finished artifact, leaving the state machine in
    /// `Stopped`.
    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    pub async fn stats(&self) -> RecorderStats {
        let chunk_count = {
            let acc = self.accumulator.lock().await;
            acc.len()
        };

        // The pump only finishes while still Recording when the device
        // ended delivery on its own; stop/reset take the handle first.
        let delivery_ended = self.state == CaptureState::Recording
            && self.pump_task.as_ref().is_some_and(|task| task.is_finished());

        RecorderStats {
            state: self.state,
            elapsed_secs: self.elapsed_secs.load(Ordering::SeqCst),
            chunk_count,
            started_at: self.started_at,
            delivery_ended,
        }
    }

    /// Release the device if it is still held. Idempotent: the held check
    /// plus the device contract make a double release a no-op.
    async fn release_device(&mut self) {
        if !self.device.is_held() {
            return;
        }
        if let Err(e) = self.device.release().await {
            warn!(device = self.device.name(), "device release failed: {e}");
        }
    }

    async fn join_tasks(&mut self) {
        if let Some(task) = self.pump_task.take() {
            // Delivery has ended, so the pump finishes after draining
            // whatever was queued.
            if let Err(e) = task.await {
                warn!("chunk pump task failed: {e}");
            }
        }
        if let Some(task) = self.ticker_task.take() {
            task.abort();
        }
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        // Device implementations release the hardware on drop; the tasks
        // must not outlive the controller.
        if let Some(task) = self.pump_task.take() {
            task.abort();
        }
        if let Some(task) = self.ticker_task.take() {
            task.abort();
        }
    }
}

/// Format an elapsed-seconds counter as `M:SS` for display.
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
