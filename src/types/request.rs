use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Which part of the source to download.
///
/// Timestamps are kept as typed by the user, they are only parsed
/// when the download options are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeMode {
    Full,
    Partial { start: String, end: String },
}

/// Everything the user selected for one download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub url: String,
    pub kind: MediaKind,
    pub range: RangeMode,
    pub custom_name: Option<String>,
}

impl MediaRequest {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
            range: RangeMode::Full,
            custom_name: None,
        }
    }

    pub fn partial(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.range = RangeMode::Partial {
            start: start.into(),
            end: end.into(),
        };
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    /// The custom name, if the user typed something other than blanks
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
