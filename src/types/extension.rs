use std::fmt::Display;

use super::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Mp3,
    Mp4,
}

impl Extension {
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => Extension::Mp3,
            MediaKind::Video => Extension::Mp4,
        }
    }

    /// Return the extension without the leading dot.
    /// e.g. "ext"
    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Mp3 => "mp3",
            Extension::Mp4 => "mp4",
        }
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
