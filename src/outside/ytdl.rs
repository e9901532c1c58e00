use std::{ffi::OsString, io::Write};

use miette::{Context, IntoDiagnostic};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{
    command::{assert_success_command, run_command, run_streaming, Capture},
    Ffmpeg,
};
use crate::{
    options::{DownloadJob, JobSource},
    result::{Error, FetchFailure, Result},
    types::{RawProgress, VideoMetadata},
};

/// Favors a single combined stream or an H.264 track, it is only used to
/// resolve the metadata before the real format is chosen
pub const METADATA_FORMAT: &str = "best/bestvideo[vcodec^=avc1]";

/// Interface for resolving and downloading web videos
pub trait MediaExtractor: Send + Sync {
    /// Resolve the URL into the video metadata, without downloading any media
    fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Download and process the job.
    ///
    /// Progress must be reported through the job's sink. The call returns
    /// once the final file has been written.
    fn download(&self, job: &DownloadJob) -> Result<()>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug)]
pub struct Ytdlp {
    program: String,
    ffmpeg_location: Option<String>,
}

impl Ytdlp {
    /// Verify that the `yt-dlp` binary is reachable
    pub fn new(program: &str, ffmpeg: &Ffmpeg) -> Result<Self> {
        assert_success_command(program, |cmd| cmd.arg("--version"))
            .map_err(|err| err.wrap_err_with(|| format!("{program} not found")))?;

        Ok(Self {
            program: program.to_owned(),
            ffmpeg_location: ffmpeg.location().map(str::to_owned),
        })
    }
}

impl MediaExtractor for Ytdlp {
    fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let res = run_command(
            &self.program,
            |cmd| {
                cmd.arg("--quiet")
                    .arg("--no-warnings")
                    .arg("--no-playlist")
                    .arg("--skip-download")
                    .arg("--dump-single-json")
                    .args(["-f", METADATA_FORMAT])
                    .arg("--")
                    .arg(url)
            },
            Capture::STDOUT | Capture::STDERR,
        )?;

        if !res.status.success() {
            let stderr = String::from_utf8_lossy(&res.stderr);
            return Err(Error::Fetch(classify_failure(&stderr)));
        }

        let raw = serde_json::from_slice::<serde_json::Value>(&res.stdout).map_err(|err| {
            Error::Fetch(FetchFailure::Extraction(format!(
                "Could not parse the info JSON: {err}"
            )))
        })?;

        VideoMetadata::from_info_json(url, raw)
    }

    fn download(&self, job: &DownloadJob) -> Result<()> {
        // The info file must outlive the command
        let mut info_file: Option<NamedTempFile> = None;
        let source: Vec<OsString> = match &job.source {
            JobSource::Url(url) => vec!["--".into(), url.into()],
            JobSource::Resolved(info) => {
                let file = info_file.insert(write_info_json(info)?);
                vec!["--load-info-json".into(), file.path().into()]
            }
        };

        let res = run_streaming(
            &self.program,
            |cmd| {
                cmd.args(job.to_args());
                if let Some(location) = &self.ffmpeg_location {
                    cmd.args(["--ffmpeg-location", location.as_str()]);
                }
                cmd.args(&source)
            },
            |line| match RawProgress::from_line(line) {
                Some(raw) => job.progress.report(&raw),
                None => debug!("yt-dlp: {line}"),
            },
        )?;

        if !res.status.success() {
            let message = last_error_line(&res.stderr)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{} exited with {}", self.program, res.status));
            return Err(Error::Download(message));
        }

        let output = job.output_path();
        if !output.exists() {
            warn!("yt-dlp succeeded but {} was not found", output.display());
        }

        Ok(())
    }
}

fn write_info_json(info: &serde_json::Value) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("bcdl-")
        .suffix(".info.json")
        .tempfile()?;

    serde_json::to_writer(&mut file, info)
        .into_diagnostic()
        .wrap_err("Could not write the info JSON")?;
    file.flush()?;

    Ok(file)
}

/// The last `ERROR:` line, or the last non-empty one if there is none
fn last_error_line(stderr: &str) -> Option<&str> {
    let lines = stderr.lines().map(str::trim).filter(|line| !line.is_empty());
    let last = lines.clone().next_back();

    lines
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or(last)
}

/// Sort a failed resolution by what its error message says
fn classify_failure(stderr: &str) -> FetchFailure {
    const NETWORK_HINTS: [&str; 7] = [
        "unable to download",
        "timed out",
        "connection",
        "name resolution",
        "getaddrinfo",
        "http error",
        "urlopen error",
    ];

    let message = last_error_line(stderr)
        .unwrap_or("ERROR: Unknown extraction error")
        .to_owned();
    let lower = message.to_lowercase();

    if lower.contains("unsupported url") {
        FetchFailure::UnsupportedUrl(message)
    } else if lower.contains("unavailable") || lower.contains("private video") {
        FetchFailure::Unavailable(message)
    } else if NETWORK_HINTS.iter().any(|hint| lower.contains(hint)) {
        FetchFailure::Network(message)
    } else {
        FetchFailure::Extraction(message)
    }
}
