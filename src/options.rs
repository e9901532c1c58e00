use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    io::{sanitize_filename, unique_filename},
    result::{Precondition, Result},
    session::ProgressSink,
    types::{
        parse_time, Extension, MediaKind, MediaRequest, RangeMode, VideoMetadata,
        PROGRESS_TEMPLATE,
    },
};

/// Best audio stream, or the best combined one if there is no audio-only stream
pub const AUDIO_FORMAT: &str = "bestaudio/best";

/// H.264 video with AAC audio, from 2160p down to 720p, then anything
pub const VIDEO_FORMAT: &str = concat!(
    "bestvideo[ext=mp4][height<=2160][vcodec^=avc1]+bestaudio[ext=m4a]/",
    "bestvideo[ext=mp4][height<=1440][vcodec^=avc1]+bestaudio[ext=m4a]/",
    "bestvideo[ext=mp4][height<=1080][vcodec^=avc1]+bestaudio[ext=m4a]/",
    "bestvideo[ext=mp4][height<=720][vcodec^=avc1]+bestaudio[ext=m4a]/",
    "best",
);

/// Used when the title sanitizes into nothing
const FALLBACK_BASE_NAME: &str = "download";

/// Processing done by the extractor once the raw stream is downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessor {
    ExtractAudio { codec: Extension },
}

/// Section of the source to keep, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    pub start: u64,
    pub end: u64,
}

impl TrimWindow {
    /// Parse and validate the user's timestamps
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        match (parse_time(start), parse_time(end)) {
            (Some(start), Some(end)) if start < end => Ok(Self { start, end }),
            _ => Err(Precondition::InvalidTimeRange.into()),
        }
    }
}

/// What the extractor starts from
#[derive(Debug, Clone)]
pub enum JobSource {
    /// Resolve the URL again
    Url(String),
    /// Reuse an info document resolved earlier
    Resolved(Arc<serde_json::Value>),
}

/// A single use description of a download, ready to give to the extractor
#[derive(Debug)]
pub struct DownloadJob {
    pub out_dir: PathBuf,
    /// The collision free output file name, without its extension
    pub stem: String,
    pub extension: Extension,
    pub format: &'static str,
    pub post_processors: Vec<PostProcessor>,
    pub trim: Option<TrimWindow>,
    pub source: JobSource,
    pub progress: ProgressSink,
}

impl DownloadJob {
    /// Build the download options from the user's selections.
    ///
    /// Fails with [`Precondition::InvalidTimeRange`] for a partial range whose
    /// timestamps do not parse or are not ordered.
    pub fn synthesize(
        request: &MediaRequest,
        metadata: &VideoMetadata,
        out_dir: &Path,
        progress: ProgressSink,
    ) -> Result<Self> {
        let trim = match &request.range {
            RangeMode::Full => None,
            RangeMode::Partial { start, end } => Some(TrimWindow::parse(start, end)?),
        };

        let title = request.custom_name().unwrap_or(metadata.title.as_str());
        let mut base = sanitize_filename(title);
        if base.is_empty() {
            base = FALLBACK_BASE_NAME.to_owned();
        }

        let extension = Extension::for_kind(request.kind);
        let file_name = unique_filename(out_dir, &base, extension)?;
        let stem = file_name
            .strip_suffix(&format!(".{extension}"))
            .unwrap_or(&file_name)
            .to_owned();
        debug!("Resolved output file name: {file_name}");

        let (format, post_processors, source) = match request.kind {
            MediaKind::Audio => (
                AUDIO_FORMAT,
                vec![PostProcessor::ExtractAudio {
                    codec: Extension::Mp3,
                }],
                JobSource::Url(request.url.trim().to_owned()),
            ),
            MediaKind::Video => (
                VIDEO_FORMAT,
                vec![],
                JobSource::Resolved(metadata.raw.clone()),
            ),
        };

        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            stem,
            extension,
            format,
            post_processors,
            trim,
            source,
            progress,
        })
    }

    /// The path of the file once the download and its processing are done
    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.{}", self.stem, self.extension))
    }

    /// The `-o` template, relative to the output directory.
    ///
    /// When a post-processor creates the final file, the extension is left
    /// for the extractor to fill.
    pub fn output_template(&self) -> String {
        let stem = self.stem.replace('%', "%%");
        if self.post_processors.is_empty() {
            format!("{stem}.{}", self.extension)
        } else {
            format!("{stem}.%(ext)s")
        }
    }

    /// The extractor arguments for this job, the source excluded
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "--progress",
            "--newline",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "-f",
            self.format,
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push("-P".into());
        args.push(self.out_dir.clone().into_os_string());
        args.push("-o".into());
        args.push(self.output_template().into());

        for post_processor in &self.post_processors {
            match post_processor {
                PostProcessor::ExtractAudio { codec } => {
                    args.push("-x".into());
                    args.push("--audio-format".into());
                    args.push(codec.as_str().into());
                }
            }
        }

        if let Some(TrimWindow { start, end }) = self.trim {
            // Seek while reading the input and copy the streams as-is
            args.push("--downloader".into());
            args.push("ffmpeg".into());
            args.push("--downloader-args".into());
            args.push(format!("ffmpeg_i:-ss {start} -to {end}").into());
            args.push("--downloader-args".into());
            args.push("ffmpeg_o:-c:v copy -c:a copy".into());
        }

        args
    }
}
