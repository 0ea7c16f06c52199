use callwire_client::MediaGateway;
use callwire_core::{CaptureSource, Quality};

use crate::integration::init_tracing;
use crate::utils::FakeCapture;

#[tokio::test]
async fn test_release_is_idempotent() {
    init_tracing();

    let capture = FakeCapture::new();
    let gateway = MediaGateway::new(capture.clone());
    let stream = gateway.acquire(Quality::Standard).await.unwrap();

    gateway.release(&stream);
    gateway.release(&stream);
    gateway.release_all();

    assert!(stream.is_stopped());
    assert!(stream.tracks().iter().all(|t| !t.is_enabled()));
    assert_eq!(capture.stop_count(CaptureSource::Microphone), 1);
    assert_eq!(capture.stop_count(CaptureSource::Camera), 1);
    assert_eq!(gateway.active_tracks(), 0);
}

#[tokio::test]
async fn test_release_all_stops_remaining_tracks() {
    init_tracing();

    let capture = FakeCapture::new();
    let gateway = MediaGateway::new(capture.clone());
    let stream = gateway.acquire(Quality::Standard).await.unwrap();
    let screen = gateway.acquire_screen().await.unwrap();

    gateway.release_track(&screen);
    assert_eq!(gateway.active_tracks(), 2);

    gateway.release_all();

    assert!(stream.is_stopped());
    assert_eq!(capture.stop_count(CaptureSource::Screen), 1);
    assert_eq!(capture.live_devices(), 0);
}

#[tokio::test]
async fn test_stopping_a_clone_stops_the_track() {
    init_tracing();

    let capture = FakeCapture::new();
    let gateway = MediaGateway::new(capture.clone());
    let stream = gateway.acquire(Quality::Low).await.unwrap();

    let camera = stream.video_track().unwrap().clone();
    assert!(camera.stop());
    assert!(!camera.stop());

    assert!(stream.video_track().unwrap().is_stopped());
    assert_eq!(capture.stop_count(CaptureSource::Camera), 1);
    assert_eq!(gateway.active_tracks(), 1);
}
