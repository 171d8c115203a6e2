//! Continuity anchor extraction.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract the last decodable frame of a video as a JPEG.
///
/// Seeks a short window back from the end and keeps the final frame FFmpeg
/// emits. If nothing decodes there (some encoders close the stream with
/// trailing packets that yield no picture), retries once with a wider
/// window before giving up.
pub async fn extract_last_frame(
    video_path: impl AsRef<Path>,
    frame_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let frame_path = frame_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    for window in [0.5, 3.0] {
        let cmd = last_frame_command(video_path, frame_path, window);
        FfmpegRunner::new().run(&cmd).await?;

        if frame_is_usable(frame_path) {
            return Ok(());
        }
    }

    Err(MediaError::NoDecodableFrame(video_path.to_path_buf()))
}

/// `-update 1` makes FFmpeg overwrite the single output image for every
/// frame it decodes after the seek point, so the file left behind at
/// stream end is the video's final frame. No frame-count limit: capping
/// at one frame would keep the window's first frame instead of its last.
fn last_frame_command(video_path: &Path, frame_path: &Path, window: f64) -> FfmpegCommand {
    FfmpegCommand::new(video_path, frame_path)
        .seek_from_end(window)
        .output_arg("-update")
        .output_arg("1")
        .output_arg("-q:v")
        .output_arg("2")
}

fn frame_is_usable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_rejected() {
        let result = tokio_test::block_on(extract_last_frame(
            "/nonexistent/video.mp4",
            "/tmp/frame.jpg",
        ));
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[test]
    fn test_command_overwrites_until_stream_end() {
        let cmd = last_frame_command(Path::new("in.mp4"), Path::new("frame.jpg"), 0.5);
        let args = cmd.build_args();

        // -update keeps rewriting frame.jpg, so the last decoded frame wins
        assert!(args.windows(2).any(|w| w == ["-update", "1"]));
        // a frame-count cap would stop at the seek window's FIRST frame
        assert!(!args.contains(&"-frames:v".to_string()));

        let sseof = args.iter().position(|a| a == "-sseof").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(sseof < input, "end-relative seek must precede the input");
    }

    #[test]
    fn test_empty_frame_is_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("frame.jpg");
        std::fs::write(&empty, b"").unwrap();
        assert!(!frame_is_usable(&empty));

        let missing = dir.path().join("missing.jpg");
        assert!(!frame_is_usable(&missing));

        let nonempty = dir.path().join("ok.jpg");
        std::fs::write(&nonempty, b"\xFF\xD8\xFF").unwrap();
        assert!(frame_is_usable(&nonempty));
    }
}
