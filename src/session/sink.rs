use std::path::Path;

use crate::types::{ProgressEvent, VideoMetadata};

/// The events a front-end receives from a [`Session`](super::Session).
///
/// They are always delivered on the thread pumping the session.
pub trait UiSink {
    fn metadata_ready(&mut self, metadata: &VideoMetadata);

    fn metadata_error(&mut self, message: &str);

    /// Only the latest value matters, intermediate ones may be skipped
    fn progress(&mut self, event: ProgressEvent);

    fn download_finished(&mut self, outcome: Result<&Path, &str>);
}
