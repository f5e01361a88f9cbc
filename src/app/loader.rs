//! Background file loading with "latest request wins" semantics.
//!
//! Every `submit` takes a fresh token from a shared counter and runs the
//! pipeline on its own worker thread. A finished run is only published if
//! its token is still the newest one, and the receiving side checks again
//! before touching UI state. Selecting another file (or calling `cancel`)
//! therefore makes any in-flight run harmless.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::pipeline::{AnalyzeOptions, run_file};
use crate::domain::{PipelineState, SalesReport};
use crate::error::AppError;

/// Outcome of one background run.
#[derive(Debug)]
pub struct LoadResult {
    pub token: u64,
    pub path: PathBuf,
    pub outcome: Result<SalesReport, AppError>,
}

pub struct Loader {
    latest: Arc<AtomicU64>,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    options: AnalyzeOptions,
}

impl Loader {
    pub fn new(options: AnalyzeOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
            options,
        }
    }

    /// Options used by subsequent submissions.
    pub fn set_options(&mut self, options: AnalyzeOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Token of the newest request.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Start processing `path` and return the new request's token.
    pub fn submit(&self, path: PathBuf) -> u64 {
        let options = self.options.clone();
        let job_path = path.clone();
        self.submit_with(path, move || run_file(&job_path, &options))
    }

    /// Mark `path` as loading in `state` and submit it.
    pub fn begin(&self, path: PathBuf, state: &mut PipelineState) -> u64 {
        let token = self.submit(path.clone());
        *state = PipelineState::Loading { path, token };
        token
    }

    fn submit_with<F>(&self, path: PathBuf, job: F) -> u64
    where
        F: FnOnce() -> Result<SalesReport, AppError> + Send + 'static,
    {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let outcome = job();
            if latest.load(Ordering::SeqCst) != token {
                debug!(token, path = %path.display(), "stale load discarded before publish");
                return;
            }
            // The receiver only disappears when the loader is dropped.
            let _ = tx.send(LoadResult { token, path, outcome });
        });

        debug!(token, "load submitted");
        token
    }

    /// Invalidate every in-flight request.
    pub fn cancel(&self) {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(token, "loads cancelled");
    }

    /// Non-blocking: the newest current result, if one has arrived.
    pub fn poll(&self) -> Option<LoadResult> {
        let mut found = None;
        while let Ok(result) = self.rx.try_recv() {
            if let Some(current) = self.keep_if_current(result) {
                found = Some(current);
            }
        }
        found
    }

    /// Block up to `timeout` for a current result.
    pub fn wait(&self, timeout: Duration) -> Option<LoadResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(result) => {
                    if let Some(current) = self.keep_if_current(result) {
                        return Some(current);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Poll and fold any current result into `state`. Returns `true` when
    /// the state changed.
    pub fn apply(&self, state: &mut PipelineState) -> bool {
        match self.poll() {
            Some(result) => {
                finish(state, result);
                true
            }
            None => false,
        }
    }

    fn keep_if_current(&self, result: LoadResult) -> Option<LoadResult> {
        if result.token == self.latest() {
            Some(result)
        } else {
            debug!(token = result.token, latest = self.latest(), "stale load dropped");
            None
        }
    }
}

/// Replace `state` with the outcome of a finished run.
pub fn finish(state: &mut PipelineState, result: LoadResult) {
    *state = match result.outcome {
        Ok(report) => PipelineState::Success(Box::new(report)),
        Err(err) => PipelineState::Failure(err),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const WAIT: Duration = Duration::from_secs(5);
    const SHORT: Duration = Duration::from_millis(100);

    fn failing(msg: &'static str) -> impl FnOnce() -> Result<SalesReport, AppError> + Send + 'static {
        move || Err(AppError::io(msg))
    }

    /// A job that waits for the returned sender before finishing.
    fn gated(msg: &'static str) -> (Sender<()>, impl FnOnce() -> Result<SalesReport, AppError> + Send + 'static) {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let job = move || {
            let _ = gate_rx.recv();
            Err(AppError::io(msg))
        };
        (gate_tx, job)
    }

    #[test]
    fn newer_request_wins_over_slower_older_one() {
        let loader = Loader::new(AnalyzeOptions::default());
        let (release_old, old_job) = gated("old");
        let old = loader.submit_with(PathBuf::from("old.xlsx"), old_job);
        let new = loader.submit_with(PathBuf::from("new.xlsx"), failing("new"));
        assert!(new > old);

        let result = loader.wait(WAIT).expect("newest result");
        assert_eq!(result.token, new);
        assert_eq!(result.path, PathBuf::from("new.xlsx"));

        release_old.send(()).unwrap();
        assert!(loader.wait(SHORT).is_none());
    }

    #[test]
    fn cancel_discards_in_flight_work() {
        let loader = Loader::new(AnalyzeOptions::default());
        let (release, job) = gated("slow");
        loader.submit_with(PathBuf::from("slow.xlsx"), job);
        loader.cancel();
        release.send(()).unwrap();
        assert!(loader.wait(SHORT).is_none());
    }

    #[test]
    fn finished_run_updates_state() {
        let loader = Loader::new(AnalyzeOptions::default());
        let token = loader.submit_with(PathBuf::from("gone.xlsx"), failing("unreadable"));
        let mut state = PipelineState::Loading {
            path: PathBuf::from("gone.xlsx"),
            token,
        };
        assert!(state.is_loading());

        let result = loader.wait(WAIT).expect("result");
        finish(&mut state, result);
        match state {
            PipelineState::Failure(err) => {
                assert_eq!(err.kind(), ErrorKind::Io);
                assert_eq!(err.message(), "unreadable");
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn missing_file_surfaces_as_io_failure() {
        let loader = Loader::new(AnalyzeOptions::default());
        let mut state = PipelineState::default();
        loader.begin(PathBuf::from("definitely/not/here.xlsx"), &mut state);
        assert!(state.is_loading());

        let result = loader.wait(WAIT).expect("result");
        finish(&mut state, result);
        assert!(matches!(state, PipelineState::Failure(ref e) if e.kind() == ErrorKind::Io));
    }
}
