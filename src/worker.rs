// isocdmak/src/worker.rs
//! Runs a build on its own thread and reports back over a channel.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::error::BuildError;
use crate::iso::builder::{BuildSummary, ImageBuilder};
use crate::options::BuildOptions;
use crate::progress::{CancelToken, Progress};
use crate::source_fs::{HostFs, SourceFs};

/// How a background build ended.
#[derive(Debug)]
pub enum Completion {
    Success(BuildSummary),
    /// Cancelled by the owner. Any partial output has been removed.
    Cancelled,
    Error(BuildError),
}

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    /// Always the last event sent.
    Completed(Completion),
}

/// Handle to a build running on a background thread.
pub struct BuildWorker {
    cancel: CancelToken,
    events: Receiver<WorkerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl BuildWorker {
    /// Builds `options` from the host filesystem.
    pub fn spawn(options: BuildOptions) -> io::Result<Self> {
        Self::spawn_builder(ImageBuilder::<HostFs>::new(options))
    }

    /// Runs `builder` on a new thread. A `VolumeTimestamp::Now` stamp is
    /// resolved here, on the calling thread.
    pub fn spawn_builder<F>(builder: ImageBuilder<F>) -> io::Result<Self>
    where
        F: SourceFs + Send + 'static,
    {
        let builder = builder.resolve_timestamp();
        let cancel = CancelToken::new();
        let (tx, events) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let thread = thread::Builder::new()
            .name("isocdmak-build".to_string())
            .spawn(move || run_build(builder, worker_cancel, tx))?;

        Ok(Self {
            cancel,
            events,
            thread: Some(thread),
        })
    }

    /// Asks the build to stop at the next entry or copy chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Blocks until the build finishes, passing progress to `on_progress`.
    pub fn wait(mut self, mut on_progress: impl FnMut(Progress)) -> Completion {
        let mut completion = None;
        for event in self.events.iter() {
            match event {
                WorkerEvent::Progress(progress) => on_progress(progress),
                WorkerEvent::Completed(done) => {
                    completion = Some(done);
                    break;
                }
            }
        }
        self.join_thread();

        completion.unwrap_or_else(|| {
            Completion::Error(BuildError::Io(io::Error::other(
                "build thread exited without reporting completion",
            )))
        })
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("build thread panicked");
            }
        }
    }
}

impl Drop for BuildWorker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
            self.join_thread();
        }
    }
}

fn run_build<F: SourceFs>(builder: ImageBuilder<F>, cancel: CancelToken, tx: Sender<WorkerEvent>) {
    let mut output_created = false;
    let mut report = |progress: Progress| {
        // The owner may have stopped listening; the build carries on regardless.
        let _ = tx.send(WorkerEvent::Progress(progress));
    };
    let result = builder.build_tracked(&cancel, &mut report, &mut output_created);

    let completion = match result {
        Ok(summary) => Completion::Success(summary),
        Err(BuildError::Cancelled) => {
            let output = &builder.options().output_file;
            if output_created {
                match builder.fs().remove_file(output) {
                    Ok(()) => debug!(output = %output.display(), "removed cancelled image"),
                    Err(e) => warn!(output = %output.display(), error = %e, "could not remove cancelled image"),
                }
            }
            Completion::Cancelled
        }
        Err(e) => {
            error!(error = %e, "image build failed");
            Completion::Error(e)
        }
    };
    let _ = tx.send(WorkerEvent::Completed(completion));
}
