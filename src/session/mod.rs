mod message;
mod sink;

use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
};
#[cfg(test)]
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

pub use message::{ProgressSink, WorkerEvent};
pub use sink::UiSink;

use crate::{
    options::DownloadJob,
    outside::MediaExtractor,
    result::{Error, Precondition, Result},
    types::{MediaRequest, ProgressEvent, VideoMetadata},
};

/// What the front-end should allow, derived from the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No URL, or the last fetch failed, or the last download is over
    Idle,
    Fetching,
    /// Metadata is available, a download can start
    Ready,
    Downloading,
}

/// What happened to a download request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStart {
    /// A job is already running, the request was dropped
    Busy,
    /// No metadata has been fetched for the requested URL
    NotReady,
    /// A precondition failed, it will be reported as the job outcome
    Rejected,
    Started,
}

#[derive(Debug)]
enum FetchState {
    Idle,
    Fetching,
    Ready(VideoMetadata),
}

/// The running job. Holding one closes the gate to any other download.
#[derive(Debug)]
struct JobHandle {
    /// None when the job was rejected before starting
    thread: Option<JoinHandle<()>>,
}

/// The state of one user session, owned by the interactive thread.
///
/// Background workers never touch it directly: they send [`WorkerEvent`]s
/// that are applied when the owner calls [`Session::pump`].
pub struct Session {
    extractor: Arc<dyn MediaExtractor>,
    out_dir: PathBuf,

    /// Incremented on every URL change, to recognize stale fetches
    generation: u64,
    fetch: FetchState,
    outstanding_fetches: usize,
    job: Option<JobHandle>,

    sender: Sender<WorkerEvent>,
    receiver: Receiver<WorkerEvent>,
}

impl Session {
    pub fn new(extractor: Arc<dyn MediaExtractor>, out_dir: PathBuf) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            extractor,
            out_dir,
            generation: 0,
            fetch: FetchState::Idle,
            outstanding_fetches: 0,
            job: None,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.job.is_some() {
            return SessionState::Downloading;
        }

        match self.fetch {
            FetchState::Idle => SessionState::Idle,
            FetchState::Fetching => SessionState::Fetching,
            FetchState::Ready(_) => SessionState::Ready,
        }
    }

    /// The metadata of the current URL, once fetched
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        match &self.fetch {
            FetchState::Ready(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Whether a fetch or a download is still expected to report back
    pub fn is_working(&self) -> bool {
        self.outstanding_fetches > 0 || self.job.is_some()
    }

    /// Forget the previous URL and start fetching the metadata of the new one.
    ///
    /// A fetch still running for a previous URL is not stopped,
    /// but its result will be ignored.
    pub fn set_url(&mut self, url: &str) {
        self.generation += 1;
        let url = url.trim().to_owned();

        if url.is_empty() {
            self.fetch = FetchState::Idle;
            return;
        }

        self.fetch = FetchState::Fetching;
        self.outstanding_fetches += 1;

        let generation = self.generation;
        let extractor = self.extractor.clone();
        let sender = self.sender.clone();

        debug!("Fetching metadata of '{url}' (request {generation})");
        let spawned = thread::Builder::new()
            .name("fetch".to_owned())
            .spawn(move || {
                let result = extractor
                    .fetch_metadata(&url)
                    .map_err(|err| err.to_string());
                let _ = sender.send(WorkerEvent::Metadata { generation, result });
            });

        if let Err(err) = spawned {
            self.push(WorkerEvent::Metadata {
                generation,
                result: Err(format!("Could not start fetching: {err}")),
            });
        }
    }

    /// Start downloading the request in the background.
    ///
    /// Only one job may run at a time: a request made while one is running
    /// is dropped. Precondition failures are not returned, they are reported
    /// to the front-end like any failed download.
    pub fn start_download(&mut self, request: &MediaRequest) -> DownloadStart {
        if self.job.is_some() {
            debug!("A download is already running, ignoring the request");
            return DownloadStart::Busy;
        }

        let url = request.url.trim();
        if url.is_empty() {
            return self.reject(Precondition::MissingUrl.into());
        }

        let job = match &self.fetch {
            FetchState::Ready(metadata) if metadata.url == url => self.prepare(request, metadata),
            _ => return DownloadStart::NotReady,
        };
        let job = match job {
            Ok(job) => job,
            Err(err) => return self.reject(err),
        };

        let extractor = self.extractor.clone();
        let sender = self.sender.clone();

        info!("Downloading into {}", job.output_path().display());
        let spawned = thread::Builder::new()
            .name("download".to_owned())
            .spawn(move || {
                // The session waits for an outcome, even from a panicking extractor
                let download = panic::catch_unwind(AssertUnwindSafe(|| extractor.download(&job)));
                let outcome = match download {
                    Ok(Ok(())) => Ok(job.output_path()),
                    Ok(Err(err)) => Err(format!("Error: {err}")),
                    Err(_) => Err("Error: The download worker panicked".to_owned()),
                };
                let _ = sender.send(WorkerEvent::Finished(outcome));
            });

        match spawned {
            Ok(thread) => {
                // The metadata belongs to the job now
                self.fetch = FetchState::Idle;
                self.job = Some(JobHandle {
                    thread: Some(thread),
                });
                DownloadStart::Started
            }
            Err(err) => self.reject(err.into()),
        }
    }

    /// Apply every pending worker event without blocking.
    /// Return the number of events received.
    pub fn pump(&mut self, sink: &mut dyn UiSink) -> usize {
        let events: Vec<_> = self.receiver.try_iter().collect();
        let count = events.len();
        self.apply_all(events, sink);
        count
    }

    /// Wait up to `timeout` for a worker event, then apply all the pending ones.
    /// Return false if nothing arrived in time.
    #[cfg(test)]
    fn wait(&mut self, sink: &mut dyn UiSink, timeout: Duration) -> bool {
        let Ok(first) = self.receiver.recv_timeout(timeout) else {
            return false;
        };

        let mut events = vec![first];
        events.extend(self.receiver.try_iter());
        self.apply_all(events, sink);
        true
    }

    /// Keep applying worker events until no fetch nor download is running.
    /// Return false if the timeout expired first.
    #[cfg(test)]
    fn settle(&mut self, sink: &mut dyn UiSink, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_working() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait(sink, deadline - now);
        }
        true
    }

    /// Build the job and check it against the fetched metadata
    fn prepare(&self, request: &MediaRequest, metadata: &VideoMetadata) -> Result<DownloadJob> {
        let progress = ProgressSink::new(self.sender.clone());
        let job = DownloadJob::synthesize(request, metadata, &self.out_dir, progress)?;

        if let Some(trim) = job.trim {
            if trim.end > metadata.duration_seconds {
                return Err(Precondition::EndBeyondDuration {
                    end: trim.end,
                    duration: metadata.duration_seconds,
                }
                .into());
            }
        }

        Ok(job)
    }

    /// Hold the gate and report the error as the outcome of a job that never started
    fn reject(&mut self, err: Error) -> DownloadStart {
        warn!("Download not started: {err}");
        self.job = Some(JobHandle { thread: None });
        self.push(WorkerEvent::Finished(Err(format!("Error: {err}"))));
        DownloadStart::Rejected
    }

    fn push(&self, event: WorkerEvent) {
        // Cannot fail, the receiver lives as long as the session
        let _ = self.sender.send(event);
    }

    /// Apply the events in order, delivering only the latest
    /// of consecutive progress updates
    fn apply_all(&mut self, events: Vec<WorkerEvent>, sink: &mut dyn UiSink) {
        let mut pending_progress = None;

        for event in events {
            match event {
                WorkerEvent::Progress(progress) => pending_progress = Some(progress),
                event => {
                    self.deliver_progress(pending_progress.take(), sink);
                    self.apply(event, sink);
                }
            }
        }

        self.deliver_progress(pending_progress, sink);
    }

    fn deliver_progress(&mut self, progress: Option<ProgressEvent>, sink: &mut dyn UiSink) {
        let Some(progress) = progress else {
            return;
        };

        if self.job.is_some() {
            sink.progress(progress);
        }
    }

    fn apply(&mut self, event: WorkerEvent, sink: &mut dyn UiSink) {
        match event {
            WorkerEvent::Metadata { generation, result } => {
                self.outstanding_fetches = self.outstanding_fetches.saturating_sub(1);

                if generation != self.generation {
                    debug!("Dropping the metadata of outdated request {generation}");
                    return;
                }

                match result {
                    Ok(metadata) => {
                        info!("Video duration: {} seconds", metadata.duration_seconds);
                        info!("Channel: {}", metadata.uploader);
                        sink.metadata_ready(&metadata);
                        self.fetch = FetchState::Ready(metadata);
                    }
                    Err(message) => {
                        warn!("Could not fetch the video details: {message}");
                        sink.metadata_error(&message);
                        self.fetch = FetchState::Idle;
                    }
                }
            }
            WorkerEvent::Progress(progress) => self.deliver_progress(Some(progress), sink),
            WorkerEvent::Finished(outcome) => {
                if let Some(JobHandle {
                    thread: Some(thread),
                }) = self.job.take()
                {
                    if thread.join().is_err() {
                        error!("The download worker panicked");
                    }
                }

                match &outcome {
                    Ok(path) => sink.download_finished(Ok(path)),
                    Err(message) => sink.download_finished(Err(message)),
                }

                sink.progress(ProgressEvent { percent: 0 });
            }
        }
    }
}
