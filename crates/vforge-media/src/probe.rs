//! FFprobe stream inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Codec parameters of a video file, used to decide whether segments can be
/// concatenated with stream copy or must be re-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamParams {
    /// Duration in seconds.
    pub duration: f64,
    /// Video codec name (e.g. "h264").
    pub video_codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate (fps).
    pub fps: f64,
    /// Audio codec name, if an audio stream is present.
    pub audio_codec: Option<String>,
}

impl StreamParams {
    /// True when two files share all copy-relevant codec parameters.
    pub fn copy_compatible(&self, other: &StreamParams) -> bool {
        self.video_codec == other.video_codec
            && self.width == other.width
            && self.height == other.height
            && (self.fps - other.fps).abs() < 0.01
            && self.audio_codec == other.audio_codec
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
}

/// Probe a video file for its stream parameters.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<StreamParams> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_video("no video stream found"))?;

    let audio = probe.streams.iter().find(|s| s.codec_type == "audio");

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(StreamParams {
        duration,
        video_codec: video.codec_name.clone().unwrap_or_default(),
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps: parse_frame_rate(video.avg_frame_rate.as_deref()),
        audio_codec: audio.and_then(|s| s.codec_name.clone()),
    })
}

/// Parse FFprobe's "num/den" frame rate notation.
fn parse_frame_rate(rate: Option<&str>) -> f64 {
    let Some(rate) = rate else { return 0.0 };
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(1.0);
            if den == 0.0 {
                0.0
            } else {
                num / den
            }
        }
        None => rate.parse().unwrap_or(0.0),
    }
}
