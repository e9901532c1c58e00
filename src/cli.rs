use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::types::{MediaKind, MediaRequest};

macro_rules! arg_env {
    ($v:literal) => {
        concat!("BCDL_", $v)
    };
}

/// Download a web video, or only its audio, entirely or between two timestamps.
///
/// The video is resolved and downloaded with `yt-dlp`.
/// `ffmpeg` must be installed, it converts audio and cuts ranges.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// The URL of the video to download
    pub url: String,

    /// Keep the video (mp4) or only its audio (mp3)
    #[arg(long, value_enum, default_value_t = MediaKind::Video)]
    pub kind: MediaKind,

    /// Only download from this timestamp (SS, MM:SS or HH:MM:SS).
    /// Giving either --start or --end requires the other one
    #[arg(long)]
    pub start: Option<String>,

    /// Only download up to this timestamp (SS, MM:SS or HH:MM:SS)
    #[arg(long)]
    pub end: Option<String>,

    /// The output file name, without extension. Defaults to the video title
    #[arg(long)]
    pub name: Option<String>,

    /// The path to the output directory.
    /// Defaults to a "downloads" directory next to the executable
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// The path to a TOML settings file
    #[arg(long, env = arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// Log more details, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn request(&self) -> MediaRequest {
        let mut request = MediaRequest::new(self.url.trim(), self.kind);

        if self.start.is_some() || self.end.is_some() {
            // A missing bound does not parse, the range is then rejected
            request = request.partial(
                self.start.as_deref().unwrap_or_default(),
                self.end.as_deref().unwrap_or_default(),
            );
        }

        if let Some(name) = &self.name {
            request = request.named(name.as_str());
        }

        request
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
