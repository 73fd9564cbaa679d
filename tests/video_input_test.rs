//! Tests for running the pipeline over video files


use hand_sign_guide::{
    overlay::OverlayRenderer,
    pipeline::{Command as KeyCommand, LoopControl, Pipeline, PipelineMode, PipelineSettings},
    Result,
};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};
use std::path::Path;
use std::process::Command;
use test_helpers::{hand_at, FixedDetector, RecordingSink};

/// Generate a test video with the ffmpeg test pattern
fn generate_test_video(output_path: &Path, frames: u32, resolution: &str) -> std::result::Result<(), String> {
    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=size={resolution}:rate=10"),
            "-frames:v",
            &frames.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "mjpeg",
        ])
        .arg(output_path)
        .output()
        .map_err(|e| format!("Failed to execute ffmpeg: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg failed: {stderr}"));
    }
    Ok(())
}

#[test]
#[ignore = "Requires ffmpeg"]
fn test_pipeline_over_video_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let video = dir.path().join("hands.avi");
    generate_test_video(&video, 12, "320x240").map_err(hand_sign_guide::Error::InvalidInput)?;

    let (sink, saved) = RecordingSink::new(false);
    let mut pipeline = Pipeline::new(
        Box::new(FixedDetector(vec![hand_at(60, 40, 171, 120)])),
        PipelineMode::Collect(Box::new(sink)),
        OverlayRenderer::with_default_font(20),
        PipelineSettings::default(),
    );

    let mut capture = VideoCapture::from_file(&video.to_string_lossy(), CAP_ANY)?;
    assert!(capture.is_opened()?);

    let mut processed = 0;
    let mut frame = Mat::default();
    while capture.read(&mut frame)? && !frame.empty() {
        let outcome = pipeline.process_frame(&frame)?;
        assert!(outcome.hand.is_some());
        assert_eq!(outcome.output.size()?, frame.size()?);

        // Save every third frame, as a user pressing 's' would
        if processed % 3 == 0 {
            assert_eq!(pipeline.handle_command(KeyCommand::Save, &frame), LoopControl::Continue);
        }
        processed += 1;
    }

    assert_eq!(processed, 12);
    assert_eq!(pipeline.counters().captures(), 4);
    assert_eq!(saved.borrow().len(), 4);
    Ok(())
}

#[test]
fn test_missing_video_file_does_not_open() -> Result<()> {
    // Some backends fail construction outright instead of returning a closed capture
    if let Ok(capture) = VideoCapture::from_file("/nonexistent/hands.mp4", CAP_ANY) {
        assert!(!capture.is_opened()?);
    }
    Ok(())
}
