// ── Frame snapshots ──
//
// Pulls the first decodable frame out of a video resource and scales it
// into a bounding box. Every failure along the way collapses into
// `Snapshot::Empty`; callers render a blank thumbnail instead of an error.

use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::config::SnapshotBounds;

const PNG_MIME: &str = "image/png";

/// Largest accepted bounding-box edge, in pixels.
pub const MAX_SNAPSHOT_EDGE: f64 = 16384.0;

/// Why no frame could be produced.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("decoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("decoder exited with {status}: {stderr}")]
    Decoder { status: String, stderr: String },

    #[error("no frame in source")]
    NoFrame,

    #[error("invalid bounds {width}x{height}")]
    InvalidBounds { width: f64, height: f64 },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("encoder task failed: {0}")]
    Join(String),
}

/// Produces the first decodable frame of a video resource.
pub trait FrameSource: Send + Sync {
    fn first_frame(&self, url: &Url) -> impl Future<Output = Result<DynamicImage, SnapshotError>> + Send;
}

/// Decodes frames by piping one PNG out of an `ffmpeg` child process.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    program: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(15),
        }
    }
}

impl FfmpegFrameSource {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    async fn first_frame(&self, url: &Url) -> Result<DynamicImage, SnapshotError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", "error", "-nostdin", "-i", url.as_str()])
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), %url, "decoding first frame");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SnapshotError::Timeout(self.timeout))?
            .map_err(|source| SnapshotError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnapshotError::Decoder {
                status: output.status.to_string(),
                stderr: stderr.trim().chars().take(200).collect(),
            });
        }
        if output.stdout.is_empty() {
            return Err(SnapshotError::NoFrame);
        }
        Ok(image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)?)
    }
}

/// An encoded, scaled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotResult {
    /// PNG bytes at the truncated raster size.
    pub encoded_image: Vec<u8>,
    /// Fitted width, before truncation.
    pub width: f64,
    /// Fitted height, before truncation.
    pub height: f64,
}

impl SnapshotResult {
    pub fn mime_type(&self) -> &'static str {
        PNG_MIME
    }

    pub fn pixel_width(&self) -> u32 {
        raster_len(self.width)
    }

    pub fn pixel_height(&self) -> u32 {
        raster_len(self.height)
    }
}

/// Outcome of a decode: a frame, or the empty sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Frame(SnapshotResult),
    Empty,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn frame(&self) -> Option<&SnapshotResult> {
        match self {
            Self::Frame(result) => Some(result),
            Self::Empty => None,
        }
    }

    /// `data:image/png;base64,...`, or an empty string for [`Snapshot::Empty`].
    pub fn data_url(&self) -> String {
        match self {
            Self::Frame(result) => {
                format!("data:{};base64,{}", result.mime_type(), STANDARD.encode(&result.encoded_image))
            }
            Self::Empty => String::new(),
        }
    }
}

/// Fit a frame into the bounding box, preserving aspect ratio.
///
/// Landscape frames fill the width, portrait and square frames fill the
/// height. The other side follows the aspect ratio and is not clamped, so a
/// 4:3 frame in a 3:2 box overflows the height.
pub fn fit_dimensions(native_width: u32, native_height: u32, bounds: SnapshotBounds) -> (f64, f64) {
    let w = f64::from(native_width);
    let h = f64::from(native_height);
    if w > h {
        (bounds.max_width, bounds.max_width * h / w)
    } else {
        (bounds.max_height * w / h, bounds.max_height)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn raster_len(v: f64) -> u32 {
    (v.trunc() as u32).max(1)
}

/// Turns video resources into scaled thumbnails.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshotExtractor<S> {
    source: S,
}

impl<S: FrameSource> FrameSnapshotExtractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Decode the first frame of `source_url` scaled into the given box.
    ///
    /// Never fails: any error is logged and yields [`Snapshot::Empty`].
    pub async fn decode(&self, source_url: &Url, max_width: f64, max_height: f64) -> Snapshot {
        let bounds = SnapshotBounds { max_width, max_height };
        match self.try_decode(source_url, bounds).await {
            Ok(result) => Snapshot::Frame(result),
            Err(e) => {
                warn!(url = %source_url, error = %e, "snapshot unavailable");
                Snapshot::Empty
            }
        }
    }

    /// [`decode`](Self::decode) with a [`SnapshotBounds`].
    pub async fn decode_within(&self, source_url: &Url, bounds: SnapshotBounds) -> Snapshot {
        self.decode(source_url, bounds.max_width, bounds.max_height).await
    }

    async fn try_decode(&self, source_url: &Url, bounds: SnapshotBounds) -> Result<SnapshotResult, SnapshotError> {
        let valid = |v: f64| v.is_finite() && v > 0.0 && v <= MAX_SNAPSHOT_EDGE;
        if !valid(bounds.max_width) || !valid(bounds.max_height) {
            return Err(SnapshotError::InvalidBounds {
                width: bounds.max_width,
                height: bounds.max_height,
            });
        }

        let frame = self.source.first_frame(source_url).await?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(SnapshotError::NoFrame);
        }
        tokio::task::spawn_blocking(move || render(&frame, bounds))
            .await
            .map_err(|e| SnapshotError::Join(e.to_string()))?
    }
}

/// Nearest-neighbour scale to the truncated raster size, then PNG-encode.
fn render(frame: &DynamicImage, bounds: SnapshotBounds) -> Result<SnapshotResult, SnapshotError> {
    let (width, height) = fit_dimensions(frame.width(), frame.height(), bounds);
    let scaled = frame.resize_exact(raster_len(width), raster_len(height), FilterType::Nearest);
    let mut encoded = Cursor::new(Vec::new());
    scaled.write_to(&mut encoded, ImageFormat::Png)?;
    Ok(SnapshotResult {
        encoded_image: encoded.into_inner(),
        width,
        height,
    })
}
