//! FFprobe duration probing.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Probe the duration of a media file in seconds.
///
/// Fails when `ffprobe` exits non-zero or prints something that does not
/// parse as a float.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let args = duration_args();
    debug!("Running FFprobe: ffprobe {} {}", args.join(" "), path.display());

    let output = Command::new("ffprobe")
        .args(&args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe exited with {}", output.status),
            Some(stderr.chars().take(500).collect()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration(&stdout)?;

    info!(
        duration = format!("{:.2}", duration).as_str(),
        path = %path.display(),
        "Video duration detected"
    );

    Ok(duration)
}

fn duration_args() -> Vec<String> {
    [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn parse_duration(stdout: &str) -> MediaResult<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::InvalidDuration(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("20.041667\n").unwrap() - 20.041667).abs() < 1e-9);
        assert!((parse_duration("7").unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(matches!(parse_duration("N/A"), Err(MediaError::InvalidDuration(_))));
        assert!(matches!(parse_duration(""), Err(MediaError::InvalidDuration(_))));
        assert!(matches!(parse_duration("-3.0"), Err(MediaError::InvalidDuration(_))));
        assert!(matches!(parse_duration("inf"), Err(MediaError::InvalidDuration(_))));
    }

    #[test]
    fn test_duration_args() {
        let args = duration_args();
        assert!(args.contains(&"format=duration".to_string()));
        assert!(args.contains(&"default=noprint_wrappers=1:nokey=1".to_string()));
    }
}
