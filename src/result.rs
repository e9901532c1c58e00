use std::fmt::Display;

use miette::miette;

/// A condition detected before any external program is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    MissingUrl,
    MissingTranscoder,
    InvalidTimeRange,
    EndBeyondDuration { end: u64, duration: u64 },
}

impl Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::MissingUrl => write!(f, "Please enter a video URL"),
            Precondition::MissingTranscoder => write!(f, "FFmpeg not found!"),
            Precondition::InvalidTimeRange => write!(f, "Invalid time range"),
            Precondition::EndBeyondDuration { end, duration } => write!(
                f,
                "End time exceeds video duration ({end}s > {duration}s)"
            ),
        }
    }
}

/// Why the extractor could not resolve a URL into metadata.
///
/// The message is the last `ERROR:` line reported by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    UnsupportedUrl(String),
    Unavailable(String),
    Network(String),
    Extraction(String),
}

impl FetchFailure {
    pub fn message(&self) -> &str {
        match self {
            FetchFailure::UnsupportedUrl(msg)
            | FetchFailure::Unavailable(msg)
            | FetchFailure::Network(msg)
            | FetchFailure::Extraction(msg) => msg,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Precondition(Precondition),
    Fetch(FetchFailure),
    Download(String),

    Miette(miette::Report),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Precondition(cond) => cond.fmt(f),
            Error::Fetch(failure) => f.write_str(failure.message()),
            Error::Download(msg) => f.write_str(msg),
            Error::Miette(report) => report.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<Precondition> for Error {
    fn from(cond: Precondition) -> Self {
        Error::Precondition(cond)
    }
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette!("{err}"))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Miette(err) => err,
            err => miette!("{err}"),
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn err_msg<D: Display>(msg: D) -> Error {
    Error::Miette(miette!("{msg}"))
}

pub fn bail<T, D: Display>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}
