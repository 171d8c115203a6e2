//! Ordered segment concatenation.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// How the segments were joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// All segments shared codec parameters; streams were copied.
    StreamCopy,
    /// Codec parameters differed; everything was re-encoded.
    Reencode,
}

/// Concatenate video files, in the order given, into one container.
///
/// Prefers stream copy when every input shares the same codec parameters
/// and falls back to re-encoding otherwise. Input order is always
/// preserved either way.
pub async fn concat_segments(
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<ConcatMode> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(MediaError::invalid_video("no segments to concatenate"));
    }
    for input in inputs {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.clone()));
        }
    }

    let mode = select_mode(inputs).await?;
    debug!("Concatenating {} segments via {:?}", inputs.len(), mode);

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list_body(inputs)).await?;

    let cmd = FfmpegCommand::new(&list_path, output)
        .input_args(["-f", "concat", "-safe", "0"]);
    let cmd = match mode {
        ConcatMode::StreamCopy => cmd.video_codec("copy").audio_codec("copy"),
        ConcatMode::Reencode => cmd
            .video_codec("libx264")
            .output_args(["-preset", "veryfast", "-crf", "20", "-pix_fmt", "yuv420p"])
            .audio_codec("aac")
            .output_args(["-b:a", "128k"]),
    };

    let result = FfmpegRunner::new().run(&cmd).await;

    // Clean up the list file regardless of outcome
    let _ = tokio::fs::remove_file(&list_path).await;
    result?;

    info!(
        "Concatenated {} segments into {} ({:?})",
        inputs.len(),
        output.display(),
        mode
    );
    Ok(mode)
}

/// Decide between stream copy and re-encode by probing every input.
async fn select_mode(inputs: &[PathBuf]) -> MediaResult<ConcatMode> {
    let first = probe_video(&inputs[0]).await?;
    for input in &inputs[1..] {
        let params = probe_video(input).await?;
        if !first.copy_compatible(&params) {
            return Ok(ConcatMode::Reencode);
        }
    }
    Ok(ConcatMode::StreamCopy)
}

/// Build the concat demuxer list, escaping single quotes per FFmpeg rules.
fn concat_list_body(inputs: &[PathBuf]) -> String {
    let mut body = String::new();
    for path in inputs {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        body.push_str("file '");
        body.push_str(&escaped);
        body.push_str("'\n");
    }
    body
}
