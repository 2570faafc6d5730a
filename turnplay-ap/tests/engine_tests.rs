//! Playback engine end-to-end tests
//!
//! Real clock backend, real WAV clips laid out like transcription output
//! (`<root>/sessions/<id>/turn_<n>.wav`), driven through an EngineHandle and
//! observed on the EventBus.

mod helpers;

use helpers::{turns, write_transcript_clips};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::timeout;
use turnplay_ap::config::Config;
use turnplay_ap::playback::{PlaybackEngine, PlayerCommand};
use turnplay_ap::Error;
use turnplay_common::events::{EventBus, PlaybackIntent, PlayerEvent};

const WAIT: Duration = Duration::from_secs(10);

fn config(root: &std::path::Path) -> Config {
    Config {
        root_folder: root.to_path_buf(),
        tick_interval: Duration::from_millis(10),
        event_bus_capacity: 4096,
        log_level: "debug".to_string(),
    }
}

/// Collect events until `stop` matches one (inclusive)
async fn collect_until<F>(rx: &mut broadcast::Receiver<PlayerEvent>, stop: F) -> Vec<PlayerEvent>
where
    F: Fn(&PlayerEvent) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for player event")
            .expect("event bus closed");
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn is_finished(event: &PlayerEvent) -> bool {
    matches!(event, PlayerEvent::SessionFinished { .. })
}

fn active_indexes(events: &[PlayerEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::ActiveSegmentChanged { index: Some(i), .. } => Some(*i),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_plays_all_turns_in_order() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "abc", &[Some(120), Some(80), Some(100)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    handle.play().await.unwrap();
    let events = collect_until(&mut rx, is_finished).await;

    assert_eq!(active_indexes(&events), vec![0, 1, 2]);
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::SessionFinished { completed: true, .. }
    )));

    // Intent goes Playing once, then Stopped at the end, never Paused in between
    let intents: Vec<PlaybackIntent> = events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::PlaybackStateChanged { new_state, .. } => Some(*new_state),
            _ => None,
        })
        .collect();
    assert_eq!(intents, vec![PlaybackIntent::Playing, PlaybackIntent::Stopped]);

    let status = handle.status().await.unwrap();
    assert_eq!(status.progress_ratio, 1.0);
    assert_eq!(status.playback_intent, PlaybackIntent::Stopped);
    assert_eq!(status.active_segment_index, Some(2));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_missing_clip_is_skipped() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "gap", &[Some(80), None, Some(80)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    handle.play().await.unwrap();
    let events = collect_until(&mut rx, is_finished).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, PlayerEvent::SegmentLoadFailed { index: 1, .. })));
    assert_eq!(active_indexes(&events), vec![0, 1, 2]);
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::SessionFinished { completed: true, .. }
    )));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_pause_holds_position() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "long", &[Some(2000)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    handle.play().await.unwrap();
    collect_until(&mut rx, |e| {
        matches!(e, PlayerEvent::PlaybackProgress { ratio, .. } if *ratio > 0.0)
    })
    .await;

    handle.pause().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let paused = handle.status().await.unwrap();
    assert_eq!(paused.playback_intent, PlaybackIntent::Paused);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let later = handle.status().await.unwrap();
    assert_eq!(later.progress_ratio, paused.progress_ratio);
    assert!(later.progress_ratio < 1.0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_seek_while_paused_moves_to_target_turn() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "seek", &[Some(1000), Some(1000)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    // Local players teach the global timeline both durations
    handle.send(PlayerCommand::LocalPause(0)).await.unwrap();
    handle.send(PlayerCommand::LocalPause(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    handle.seek_to_ratio(0.75).await.unwrap();
    let events = collect_until(&mut rx, |e| {
        matches!(e, PlayerEvent::ActiveSegmentChanged { index: Some(1), .. })
    })
    .await;
    assert!(!events.is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = handle.status().await.unwrap();
    assert_eq!(status.active_segment_index, Some(1));
    assert_eq!(status.playback_intent, PlaybackIntent::Paused);
    assert!((status.progress_ratio - 0.75).abs() < 1e-6, "got {}", status.progress_ratio);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_local_player_runs_independently() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "local", &[Some(100), Some(100)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    handle.send(PlayerCommand::LocalPlay(1)).await.unwrap();
    let events = collect_until(&mut rx, |e| {
        matches!(
            e,
            PlayerEvent::LocalProgress { index: 1, ratio, playing: false, .. } if *ratio == 1.0
        )
    })
    .await;

    assert!(events
        .iter()
        .all(|e| !matches!(e, PlayerEvent::ActiveSegmentChanged { .. })));

    // Global playback never started
    let status = handle.status().await.unwrap();
    assert_eq!(status.playback_intent, PlaybackIntent::Stopped);
    assert_eq!(status.active_segment_index, None);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_local_seek_then_play_to_end() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "lseek", &[Some(2000)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), bus).unwrap();
    let task = engine.spawn();

    // Opens the local player; the seek only applies once its duration is known
    handle.send(PlayerCommand::LocalPause(0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    handle.send(PlayerCommand::LocalSeek(0, 0.5)).await.unwrap();
    collect_until(&mut rx, |e| {
        matches!(
            e,
            PlayerEvent::LocalProgress { index: 0, ratio, playing: false, .. } if *ratio == 0.5
        )
    })
    .await;

    handle.send(PlayerCommand::LocalPlay(0)).await.unwrap();
    let events = collect_until(&mut rx, |e| {
        matches!(
            e,
            PlayerEvent::LocalProgress { index: 0, ratio, playing: false, .. } if *ratio == 1.0
        )
    })
    .await;

    // Resumed from the middle of the clip, not from the start
    let resumed: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::LocalProgress { ratio, playing: true, .. } => Some(*ratio),
            _ => None,
        })
        .collect();
    assert!(resumed.iter().all(|r| *r >= 0.5), "got {:?}", resumed);

    let status = handle.status().await.unwrap();
    assert_eq!(status.playback_intent, PlaybackIntent::Stopped);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_empty_transcript_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = PlaybackEngine::with_clock_backend(&[], &config(dir.path()), EventBus::new(16));
    assert!(matches!(result, Err(Error::EmptyInput)));
}

#[tokio::test]
async fn test_handle_errors_after_shutdown() {
    let dir = TempDir::new().unwrap();
    let paths = write_transcript_clips(dir.path(), "stop", &[Some(100)]).unwrap();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

    let (engine, handle) =
        PlaybackEngine::with_clock_backend(&turns(&refs), &config(dir.path()), EventBus::new(16))
            .unwrap();
    let task = engine.spawn();

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert!(matches!(handle.play().await, Err(Error::EngineStopped)));
    assert!(matches!(handle.status().await, Err(Error::EngineStopped)));
}
