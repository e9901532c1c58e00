use tracing::debug;

use crate::result::{Precondition, Result};

use super::command::{assert_success_command, FFMPEG};

/// Interface for the [ffmpeg](https://ffmpeg.org) program.
///
/// It is never run directly, the extractor drives it to extract audio
/// and to trim streams.
#[derive(Debug)]
pub struct Ffmpeg {
    program: String,
}

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new(program: &str) -> Result<Self> {
        assert_success_command(program, |cmd| cmd.arg("-version")).map_err(|err| {
            debug!("Checking {program} failed: {err}");
            Precondition::MissingTranscoder
        })?;

        Ok(Self {
            program: program.to_owned(),
        })
    }

    /// The location to hand to the extractor.
    /// None when the default binary from the `PATH` is used.
    pub fn location(&self) -> Option<&str> {
        (self.program != FFMPEG).then_some(self.program.as_str())
    }
}
