//! The sync worker. One thread, one request at a time, in the order they were
//! submitted. Every event a dispatch yields goes straight to the sink.

use ::std::sync::Arc;
use ::std::thread;

use ::crossbeam::channel::{self, Sender, Receiver};

use crate::error::{MError, MResult};
use crate::sync::backend::EventSink;
use crate::sync::dispatch::SyncDispatcher;
use crate::sync::request::SyncRequest;
use crate::sync::status::{DispatchReport, ProgressNotice};

/// Work for the worker thread
enum Job {
    Sync(SyncRequest),
    Shutdown,
}

/// Run one request to completion, publishing as we go.
pub fn run_request(dispatcher: &SyncDispatcher, sink: &dyn EventSink, request: SyncRequest) -> DispatchReport {
    let kind = request.kind();
    sink.progress(&ProgressNotice::running(&request.start_message()));
    let mut events = Vec::new();
    for ev in dispatcher.dispatch(request) {
        sink.publish(&ev);
        if ev.result().is_success() {
            sink.progress(&ProgressNotice::running(ev.message()));
        }
        events.push(ev);
    }
    let report = DispatchReport {
        kind: kind,
        events: events,
    };
    info!("sync::run_request() -- {}: {} events, {}", kind, report.events.len(), report.status());
    report
}

/// The status line to leave up once a request is done: the last thing that
/// went well, or what we were trying to do.
fn last_message(report: &DispatchReport, start: String) -> String {
    report.events.iter()
        .rev()
        .find(|ev| ev.result().is_success())
        .map(|ev| String::from(ev.message()))
        .unwrap_or(start)
}

fn worker(dispatcher: SyncDispatcher, sink: Arc<dyn EventSink>, rx: Receiver<Job>) {
    let mut last = String::from("Sync service started");
    sink.progress(&ProgressNotice::running(&last));
    loop {
        match rx.recv() {
            Ok(Job::Sync(request)) => {
                let start = request.start_message();
                let report = run_request(&dispatcher, sink.as_ref(), request);
                last = last_message(&report, start);
            }
            Ok(Job::Shutdown) => break,
            Err(_) => {
                warn!("sync::worker() -- request channel closed, quitting");
                break;
            }
        }
    }
    sink.progress(&ProgressNotice::finished(&last));
}

/// Handle to a running sync worker
pub struct SyncService {
    tx: Sender<Job>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SyncService {
    /// Spawn the worker thread.
    pub fn start(dispatcher: SyncDispatcher, sink: Arc<dyn EventSink>) -> MResult<SyncService> {
        let name: String = config::get(&["sync", "worker_name"])
            .unwrap_or_else(|_| String::from("sync:worker"));
        let (tx, rx) = channel::unbounded();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            worker(dispatcher, sink, rx);
        })?;
        info!("SyncService::start() -- {} running", name);
        Ok(SyncService {
            tx: tx,
            handle: Some(handle),
        })
    }

    /// Queue a request. Returns as soon as it's queued.
    pub fn submit(&self, request: SyncRequest) -> MResult<()> {
        if self.handle.is_none() {
            return Err(MError::Shutdown);
        }
        debug!("SyncService::submit() -- {}", request.kind());
        self.tx.send(Job::Sync(request))?;
        Ok(())
    }

    /// Finish whatever is queued, then stop the worker and wait for it.
    pub fn shutdown(&mut self) -> MResult<()> {
        let handle = match self.handle.take() {
            Some(x) => x,
            None => return Ok(()),
        };
        self.tx.send(Job::Shutdown)?;
        handle.join()?;
        info!("SyncService::shutdown() -- worker stopped");
        Ok(())
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        try_or!(self.shutdown(), e, {
            error!("SyncService::drop() -- problem stopping worker: {}", e)
        });
    }
}
