use std::path::PathBuf;

use crossbeam_channel::Sender;

use crate::types::{ProgressEvent, RawProgress, VideoMetadata};

/// Messages sent by the background workers to the session owning them
#[derive(Debug)]
pub enum WorkerEvent {
    /// Outcome of the metadata fetch started for the given URL generation
    Metadata {
        generation: u64,
        result: Result<VideoMetadata, String>,
    },
    Progress(ProgressEvent),
    /// Terminal outcome of the running job: the created file or an error message
    Finished(Result<PathBuf, String>),
}

/// Where the extractor reports the progress of a job
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: Sender<WorkerEvent>,
}

impl ProgressSink {
    pub(super) fn new(sender: Sender<WorkerEvent>) -> Self {
        Self { sender }
    }

    /// Normalize the raw counters and forward them to the session.
    pub fn report(&self, raw: &RawProgress) {
        if let Some(event) = raw.to_event() {
            // The session may already be gone, then no one is left to display it
            let _ = self.sender.send(WorkerEvent::Progress(event));
        }
    }

    /// A sink that is not connected to any session, along with its receiving end
    #[cfg(test)]
    pub fn detached() -> (Self, crossbeam_channel::Receiver<WorkerEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }
}
