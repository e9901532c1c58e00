use std::{
    io::Write,
    path::{Path, PathBuf},
};

use owo_colors::OwoColorize;
use tracing::{error, info};

use crate::{
    session::UiSink,
    types::{ProgressEvent, VideoMetadata},
};

/// Command-line front-end: a progress line on stderr, everything else logged
#[derive(Debug, Default)]
pub struct Terminal {
    /// The progress line currently drawn, if any
    drawn: Option<u8>,
    pub fetch_error: Option<String>,
    pub outcome: Option<Result<PathBuf, String>>,
}

impl Terminal {
    fn end_line(&mut self) {
        if self.drawn.take().is_some() {
            eprintln!();
        }
    }
}

impl UiSink for Terminal {
    fn metadata_ready(&mut self, metadata: &VideoMetadata) {
        info!("Found {metadata}");
        self.fetch_error = None;
    }

    fn metadata_error(&mut self, message: &str) {
        self.fetch_error = Some(message.to_owned());
    }

    fn progress(&mut self, event: ProgressEvent) {
        if self.outcome.is_some() || self.drawn == Some(event.percent) {
            return;
        }

        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{} {:>3}%", "Downloading".green(), event.percent);
        let _ = stderr.flush();
        self.drawn = Some(event.percent);
    }

    fn download_finished(&mut self, outcome: Result<&Path, &str>) {
        self.end_line();

        match outcome {
            Ok(path) => info!("Saved to {}", path.display()),
            Err(message) => error!("{message}"),
        }

        self.outcome = Some(outcome.map(Path::to_path_buf).map_err(str::to_owned));
    }
}
