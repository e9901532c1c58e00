use std::{fmt::Display, sync::Arc};

use miette::{Context, IntoDiagnostic};
use serde::Deserialize;

use crate::result::Result;

const UNKNOWN_TITLE: &str = "Unknown Video";
const UNKNOWN_UPLOADER: &str = "Unknown Channel";

/// The descriptive metadata of a video, resolved without downloading it.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// The URL the metadata was resolved from
    pub url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub uploader: String,
    /// The whole info document, handed back to the extractor when downloading
    pub raw: Arc<serde_json::Value>,
}

/// The few fields of the info document we care about
#[derive(Debug, Deserialize)]
struct InfoFields {
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
}

impl VideoMetadata {
    pub fn from_info_json(url: &str, raw: serde_json::Value) -> Result<Self> {
        let fields = InfoFields::deserialize(&raw)
            .into_diagnostic()
            .wrap_err("Unexpected shape of the info JSON")?;

        // The duration is a float but we don't need the decimals
        let duration_seconds = fields
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map_or(0, |d| d.floor() as u64);

        Ok(Self {
            url: url.to_owned(),
            title: fields.title.unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
            duration_seconds,
            uploader: fields.uploader.unwrap_or_else(|| UNKNOWN_UPLOADER.to_owned()),
            raw: Arc::new(raw),
        })
    }
}

impl Display for VideoMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' by {} ({}s)",
            self.title, self.uploader, self.duration_seconds
        )
    }
}
