// Integration tests for the recording controller: state transitions,
// artifact assembly and the release-exactly-once contract, driven through a
// scripted fake device.

mod common;

use common::ScriptedDevice;
use signstream::capture::format_elapsed;
use signstream::{CaptureConstraints, CaptureError, CaptureState, RecordingController};
use std::time::Duration;

fn controller(device: ScriptedDevice) -> RecordingController {
    RecordingController::new(Box::new(device), CaptureConstraints::default())
}

#[tokio::test]
async fn start_stop_assembles_artifact_in_capture_order() {
    let (device, counters) =
        ScriptedDevice::new(vec![b"abc".to_vec(), Vec::new(), b"def".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    assert_eq!(recorder.state(), CaptureState::Recording);

    recorder.stop().await.unwrap();
    assert_eq!(recorder.state(), CaptureState::Stopped);

    let artifact = recorder.artifact().expect("artifact should be assembled");
    assert_eq!(artifact.bytes, b"abcdef");
    assert_eq!(artifact.content_type, "audio/webm");

    // The empty chunk was discarded.
    let stats = recorder.stats().await;
    assert_eq!(stats.chunk_count, 2);

    assert_eq!(counters.acquires(), 1);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn stop_with_no_chunks_yields_no_artifact() {
    let (device, _) = ScriptedDevice::new(vec![]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    assert_eq!(recorder.state(), CaptureState::Stopped);
    assert!(recorder.artifact().is_none());
}

#[tokio::test]
async fn only_empty_chunks_yields_no_artifact() {
    let (device, _) = ScriptedDevice::new(vec![Vec::new(), Vec::new()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    assert!(recorder.artifact().is_none());
    assert_eq!(recorder.stats().await.chunk_count, 0);
}

#[tokio::test]
async fn start_while_recording_is_rejected_without_touching_capture() {
    let (device, counters) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, CaptureError::AlreadyRecording));
    assert_eq!(recorder.state(), CaptureState::Recording);
    assert_eq!(counters.acquires(), 1);

    recorder.stop().await.unwrap();
    assert!(recorder.artifact().is_some());
}

#[tokio::test]
async fn failed_acquire_leaves_prior_state_and_allows_retry() {
    let (device, counters) = ScriptedDevice::failing_first(vec![b"ok".to_vec()]);
    let mut recorder = controller(device);

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, CaptureError::Unavailable(_)));
    assert_eq!(recorder.state(), CaptureState::Idle);
    assert_eq!(counters.acquires(), 0);
    assert_eq!(counters.releases(), 0);

    // The UI stays able to retry after a denied capture.
    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();
    assert_eq!(recorder.artifact().unwrap().bytes, b"ok");
}

#[tokio::test]
async fn stop_outside_recording_is_a_noop() {
    let (device, counters) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.stop().await.unwrap();
    assert_eq!(recorder.state(), CaptureState::Idle);

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();
    recorder.stop().await.unwrap(); // second stop is a no-op, not a double release
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn reset_behaves_like_a_fresh_controller() {
    let (device, counters) = ScriptedDevice::new(vec![b"take".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();
    assert!(recorder.artifact().is_some());

    recorder.reset().await;
    assert_eq!(recorder.state(), CaptureState::Idle);
    assert!(recorder.artifact().is_none());
    assert_eq!(recorder.elapsed_secs(), 0);
    assert_eq!(recorder.stats().await.chunk_count, 0);

    // A start after reset is indistinguishable from a first start.
    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();
    assert_eq!(recorder.artifact().unwrap().bytes, b"take");
    assert_eq!(counters.acquires(), 2);
    assert_eq!(counters.releases(), 2);
}

#[tokio::test]
async fn reset_during_recording_releases_the_device() {
    let (device, counters) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    recorder.reset().await;

    assert_eq!(recorder.state(), CaptureState::Idle);
    assert_eq!(counters.releases(), 1);

    // Reset from idle is safe and does not release again.
    recorder.reset().await;
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn dropping_the_controller_mid_recording_releases_the_device() {
    let (device, counters) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    drop(recorder);

    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn device_ended_delivery_is_visible_in_stats() {
    let (device, counters) = ScriptedDevice::new(vec![b"abc".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    assert!(!recorder.stats().await.delivery_ended);

    // The device cuts delivery on its own; the recording is still live.
    counters.end_delivery();
    for _ in 0..200 {
        if recorder.stats().await.delivery_ended {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let stats = recorder.stats().await;
    assert!(stats.delivery_ended);
    assert_eq!(stats.state, CaptureState::Recording);

    // A regular stop still releases once and keeps what was delivered.
    recorder.stop().await.unwrap();
    assert_eq!(recorder.artifact().unwrap().bytes, b"abc");
    assert_eq!(counters.releases(), 1);
    assert!(!recorder.stats().await.delivery_ended);
}

#[tokio::test]
async fn load_external_artifact_validates_content_category() {
    let (device, _) = ScriptedDevice::new(vec![]);
    let mut recorder = controller(device);

    let err = recorder
        .load_external_artifact(b"mpeg".to_vec(), "video/mp4")
        .unwrap_err();
    assert!(matches!(err, CaptureError::InvalidArtifactType(_)));
    assert_eq!(recorder.state(), CaptureState::Idle);
    assert!(recorder.artifact().is_none());

    recorder
        .load_external_artifact(b"riff".to_vec(), "audio/wav")
        .unwrap();
    assert_eq!(recorder.state(), CaptureState::Stopped);
    let artifact = recorder.artifact().unwrap();
    assert_eq!(artifact.content_type, "audio/wav");
    assert_eq!(artifact.bytes, b"riff");
}

#[tokio::test]
async fn load_external_artifact_rejected_while_recording() {
    let (device, _) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    let err = recorder
        .load_external_artifact(b"riff".to_vec(), "audio/wav")
        .unwrap_err();
    assert!(matches!(err, CaptureError::AlreadyRecording));
    assert_eq!(recorder.state(), CaptureState::Recording);

    recorder.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn elapsed_counts_one_increment_per_second() {
    let (device, _) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    assert_eq!(recorder.elapsed_secs(), 0);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(recorder.elapsed_secs(), 3);

    recorder.stop().await.unwrap();
    let frozen = recorder.elapsed_secs();

    // The ticker stops with the recording.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.elapsed_secs(), frozen);
}

#[tokio::test]
async fn upload_does_not_touch_elapsed_counter() {
    let (device, _) = ScriptedDevice::new(vec![]);
    let mut recorder = controller(device);

    recorder
        .load_external_artifact(b"riff".to_vec(), "audio/wav")
        .unwrap();
    assert_eq!(recorder.elapsed_secs(), 0);
}

#[tokio::test]
async fn device_sees_requested_constraints() {
    let (device, counters) = ScriptedDevice::new(vec![b"x".to_vec()]);
    let mut recorder = controller(device);

    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    let seen = counters.constraints.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].sample_rate, 44_100);
    assert!(seen[0].echo_cancellation);
    assert!(seen[0].noise_suppression);
}

#[test]
fn elapsed_formats_as_minutes_and_seconds() {
    assert_eq!(format_elapsed(0), "0:00");
    assert_eq!(format_elapsed(5), "0:05");
    assert_eq!(format_elapsed(75), "1:15");
    assert_eq!(format_elapsed(600), "10:00");
}
