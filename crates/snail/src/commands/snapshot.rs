//! Thumbnail rendering from a stream's preview resource.

use std::time::Duration;

use serde::Serialize;

use snail_core::{FfmpegFrameSource, FrameSnapshotExtractor, Session, Snapshot, SnapshotBounds};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SnapshotSummary {
    name: String,
    path: String,
    width: u32,
    height: u32,
    bytes: usize,
}

pub async fn handle(session: &Session, args: SnapshotArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let defaults = session.config().snapshot;
    let bounds = SnapshotBounds {
        max_width: args.width.unwrap_or(defaults.max_width),
        max_height: args.height.unwrap_or(defaults.max_height),
    };

    let source = FfmpegFrameSource::new(&args.ffmpeg, Duration::from_secs(args.decode_timeout));
    let extractor = FrameSnapshotExtractor::new(source);
    let url = session.preview_url(&args.name)?;
    tracing::debug!(%url, ?bounds, "rendering snapshot");

    let snapshot = extractor.decode_within(&url, bounds).await;
    let Snapshot::Frame(frame) = &snapshot else {
        return Err(CliError::SnapshotUnavailable { name: args.name });
    };

    if args.data_url {
        output::print_output(&snapshot.data_url(), global.quiet);
        return Ok(());
    }

    let Some(path) = args.out else {
        return Err(CliError::Validation {
            field: "out".into(),
            reason: "pass --out or --data-url".into(),
        });
    };
    std::fs::write(&path, &frame.encoded_image)?;

    let summary = SnapshotSummary {
        name: args.name,
        path: path.display().to_string(),
        width: frame.pixel_width(),
        height: frame.pixel_height(),
        bytes: frame.encoded_image.len(),
    };
    let out = output::render_single(
        &global.output,
        &summary,
        |s| format!("Wrote {}x{} snapshot of '{}' to {}", s.width, s.height, s.name, s.path),
        |s| s.path.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
