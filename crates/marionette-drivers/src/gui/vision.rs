// Path: crates/marionette-drivers/src/gui/vision.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use marionette_api::ScreenshotProvider;
use marionette_telemetry::{operator_metrics, time::Timer};
use marionette_types::app::{BackendKind, ScreenGeometry, ScreenshotOutput, Size};
use marionette_types::error::OperatorError;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;
use xcap::Monitor;

/// One display as reported by the OS, paired with its capture geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSource {
    pub display_id: String,
    pub is_primary: bool,
    pub geometry: ScreenGeometry,
}

impl CaptureSource {
    fn from_monitor(monitor: &Monitor) -> Self {
        let display_id = monitor.id().to_string();
        let reported = Size::new(monitor.width(), monitor.height());
        let scale = monitor.scale_factor() as f64;
        // xcap reports points on macOS and device pixels elsewhere.
        let geometry = if cfg!(target_os = "macos") {
            ScreenGeometry::from_logical(reported, scale, display_id.clone())
        } else {
            ScreenGeometry::from_physical(reported, scale, display_id.clone())
        };
        Self {
            display_id,
            is_primary: monitor.is_primary(),
            geometry,
        }
    }
}

/// Picks the source whose id equals the primary display's id, falling back to
/// the first source. `None` only when there are no sources at all.
pub fn select_source(sources: &[CaptureSource]) -> Option<usize> {
    if sources.is_empty() {
        return None;
    }
    let primary_id = sources
        .iter()
        .find(|s| s.is_primary)
        .map(|s| s.display_id.as_str());
    let exact = primary_id.and_then(|id| sources.iter().position(|s| s.display_id == id));
    if exact.is_none() {
        tracing::debug!(target: "operator", "No primary capture source, using the first display");
    }
    Some(exact.unwrap_or(0))
}

/// Resizes a raw frame to the display's physical size and encodes it as JPEG.
///
/// Capture back-ends may rasterize at logical resolution; downstream
/// coordinate math is in physical pixels, so the returned bytes always match
/// `geometry.physical_size`.
pub fn encode_frame(frame: RgbaImage, geometry: &ScreenGeometry, quality: u8) -> Result<Vec<u8>> {
    let target = geometry.physical_size;
    let frame = if frame.width() != target.width || frame.height() != target.height {
        tracing::debug!(
            target: "operator",
            raw_width = frame.width(),
            raw_height = frame.height(),
            width = target.width,
            height = target.height,
            "Resizing capture to physical size"
        );
        image::imageops::resize(&frame, target.width, target.height, FilterType::Triangle)
    } else {
        frame
    };

    let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
        .map_err(|e| anyhow!("Failed to encode screenshot: {}", e))?;
    Ok(bytes)
}

/// Provides visual context to the model from the local desktop.
#[derive(Debug, Clone)]
pub struct LocalScreenCapture {
    jpeg_quality: u8,
    fallback_timeout: Duration,
}

impl LocalScreenCapture {
    pub fn new(jpeg_quality: u8, fallback_timeout: Duration) -> Self {
        Self {
            jpeg_quality,
            fallback_timeout,
        }
    }

    /// Captures the primary display. Returns JPEG bytes and the geometry they match.
    pub fn capture_primary(&self) -> Result<(Vec<u8>, ScreenGeometry)> {
        let monitors = Monitor::all().unwrap_or_else(|e| {
            tracing::warn!(target: "operator", error = %e, "Failed to list monitors");
            Vec::new()
        });
        let sources: Vec<CaptureSource> = monitors.iter().map(CaptureSource::from_monitor).collect();

        let Some(index) = select_source(&sources) else {
            tracing::warn!(target: "operator", "No capture sources, using the platform screenshot command");
            return self.capture_fallback();
        };
        let (Some(monitor), Some(source)) = (monitors.get(index), sources.get(index)) else {
            return self.capture_fallback();
        };

        let frame = monitor
            .capture_image()
            .map_err(|e| anyhow!("Screen capture failed: {}", e))?;
        let bytes = encode_frame(frame, &source.geometry, self.jpeg_quality)?;
        Ok((bytes, source.geometry.clone()))
    }

    /// Best-effort full-screen capture through the platform's screenshot tool.
    /// The resolution may differ from the xcap path; geometry is taken from
    /// the captured file with a scale factor of 1.
    fn capture_fallback(&self) -> Result<(Vec<u8>, ScreenGeometry)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("screen.png");
        let mut captured = false;
        for (program, args) in fallback_commands(&path) {
            match run_with_timeout(program, &args, self.fallback_timeout) {
                Ok(()) if path.exists() => {
                    captured = true;
                    break;
                }
                Ok(()) => {}
                Err(e) => {
                    tracing::debug!(target: "operator", program, error = %e, "Fallback capture command failed");
                }
            }
        }
        if !captured {
            return Err(anyhow!("No capture source and no platform screenshot command succeeded"));
        }

        let frame = image::open(&path)
            .map_err(|e| anyhow!("Failed to decode fallback capture: {}", e))?
            .to_rgba8();
        let geometry = ScreenGeometry::from_physical(
            Size::new(frame.width(), frame.height()),
            1.0,
            "fallback",
        );
        let bytes = encode_frame(frame, &geometry, self.jpeg_quality)?;
        Ok((bytes, geometry))
    }
}

fn fallback_commands(path: &Path) -> Vec<(&'static str, Vec<String>)> {
    let out = path.display().to_string();
    if cfg!(target_os = "macos") {
        vec![("screencapture", vec!["-x".into(), "-t".into(), "png".into(), out])]
    } else if cfg!(target_os = "linux") {
        vec![
            ("grim", vec![out.clone()]),
            ("import", vec!["-window".into(), "root".into(), out]),
        ]
    } else {
        Vec::new()
    }
}

fn run_with_timeout(program: &str, args: &[String], timeout: Duration) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("Failed to spawn '{}': {}", program, e))?;

    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => Ok(()),
        Some(status) => Err(anyhow!("'{}' exited with {}", program, status)),
        None => {
            child.kill()?;
            child.wait()?;
            Err(anyhow!("'{}' timed out after {:?}", program, timeout))
        }
    }
}

#[async_trait]
impl ScreenshotProvider for LocalScreenCapture {
    async fn capture(&self) -> Result<ScreenshotOutput, OperatorError> {
        let _timer = Timer::new(operator_metrics(), BackendKind::Local.as_str());
        let this = self.clone();
        let op = move || {
            this.capture_primary()
                .map_err(|e| OperatorError::Capture(e.to_string()))
        };

        // Offload to a blocking thread when a Tokio runtime is available.
        let (bytes, geometry) = if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle
                .spawn_blocking(op)
                .await
                .map_err(|e| OperatorError::Capture(format!("Task join error: {}", e)))??
        } else {
            op()?
        };

        Ok(ScreenshotOutput {
            base64_image: base64::engine::general_purpose::STANDARD.encode(bytes),
            scale_factor: geometry.scale_factor,
            geometry,
        })
    }
}
