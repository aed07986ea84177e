//! The sync dispatcher turns a `SyncRequest` into a sequence of collaborator
//! calls and reports each one as a `SyncStatusEvent`.
//!
//! Dispatching is lazy: `SyncDispatcher::dispatch()` hands back a `Dispatch`,
//! which is an iterator. Nothing runs until it is pulled on, each `next()`
//! runs steps until one of them has something to report, and once it returns
//! None it stays done. Steps that only succeed quietly (authentication,
//! cohort reconciliation) never show up as events.
//!
//! Collaborator failures never escape. An `Err` or even a panic from the
//! backend becomes a failed event for that step.

use ::std::collections::VecDeque;
use ::std::iter::FusedIterator;
use ::std::panic::{self, AssertUnwindSafe};
use ::std::sync::Arc;

use crate::error::{MError, MResult};
use crate::sync::backend::{Authenticator, SyncBackend, TimestampStore};
use crate::sync::request::{SyncKind, SyncRequest};
use crate::sync::status::{SyncResult, SyncStatus, SyncStatusEvent, SyncStep};
use crate::util;

/// One unit of work inside a dispatch.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Authenticate,
    Forms,
    Templates,
    Cohorts,
    /// find uncohorted patients after a cohort sync and pull their data
    Reconcile,
    CohortPatients { with_data: bool },
    CohortObservations,
    CohortEncounters,
    Patients(Vec<String>),
    PatientObservations(Vec<String>),
    PatientEncounters(Vec<String>),
    UploadForms,
    Notifications,
}

/// The fixed step plan for each kind of request.
fn plan(kind: SyncKind) -> Vec<Step> {
    let mut steps = vec![Step::Authenticate];
    match kind {
        SyncKind::Forms => steps.push(Step::Forms),
        SyncKind::Templates => steps.push(Step::Templates),
        SyncKind::Cohorts => steps.push(Step::Cohorts),
        SyncKind::PatientsFull => steps.push(Step::CohortPatients { with_data: true }),
        SyncKind::PatientsOnly => steps.push(Step::CohortPatients { with_data: false }),
        SyncKind::PatientsDataOnly => {
            steps.push(Step::CohortObservations);
            steps.push(Step::CohortEncounters);
        }
        SyncKind::UploadForms => steps.push(Step::UploadForms),
        // filled in from the request's uuids in Dispatch::new()
        SyncKind::DownloadPatientOnly => {}
        // observations/encounters run no matter how the notifications went
        SyncKind::Notifications => {
            steps.push(Step::Notifications);
            steps.push(Step::CohortObservations);
            steps.push(Step::CohortEncounters);
        }
    }
    steps
}

/// Holds the collaborators a dispatch talks to. Cheap to clone, and safe to
/// share with a worker thread.
#[derive(Clone)]
pub struct SyncDispatcher {
    auth: Arc<dyn Authenticator>,
    backend: Arc<dyn SyncBackend>,
    timestamps: Arc<dyn TimestampStore>,
}

impl SyncDispatcher {
    pub fn new(auth: Arc<dyn Authenticator>, backend: Arc<dyn SyncBackend>, timestamps: Arc<dyn TimestampStore>) -> SyncDispatcher {
        SyncDispatcher {
            auth: auth,
            backend: backend,
            timestamps: timestamps,
        }
    }

    /// Start dispatching a request. Nothing happens until the returned
    /// iterator is pulled.
    pub fn dispatch(&self, request: SyncRequest) -> Dispatch {
        Dispatch::new(self, request)
    }

    /// When this kind of sync last succeeded, if we track it
    pub fn last_synced(&self, kind: SyncKind) -> MResult<Option<i64>> {
        self.timestamps.last_synced(kind)
    }
}

/// Run a collaborator call, turning panics into errors.
fn guarded<T, F>(desc: &str, op: F) -> MResult<T>
    where F: FnOnce() -> MResult<T>
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(x) => x,
        Err(e) => {
            let err = toterr!(e);
            error!("dispatch::guarded() -- {}: collaborator panicked: {}", desc, err);
            Err(err)
        }
    }
}

/// Map a collaborator error onto the status its step reports.
fn status_for(step: SyncStep, err: &MError) -> SyncStatus {
    match *err {
        MError::Network(..) => SyncStatus::NetworkError,
        _ => step.failure_status(),
    }
}

/// A dispatch in progress. See the module docs.
pub struct Dispatch<'a> {
    dispatcher: &'a SyncDispatcher,
    request: SyncRequest,
    steps: VecDeque<Step>,
}

impl<'a> Dispatch<'a> {
    fn new(dispatcher: &'a SyncDispatcher, request: SyncRequest) -> Dispatch<'a> {
        let mut steps: VecDeque<Step> = plan(request.kind()).into_iter().collect();
        if request.kind() == SyncKind::DownloadPatientOnly {
            steps.push_back(Step::Patients(request.ids().to_vec()));
        }
        info!("dispatch::new() -- {}: {} steps planned", request.kind(), steps.len());
        Dispatch {
            dispatcher: dispatcher,
            request: request,
            steps: steps,
        }
    }

    /// Build the event for a finished step
    fn event(&self, step: SyncStep, result: SyncResult) -> SyncStatusEvent {
        let ev = SyncStatusEvent::new(self.request.kind(), step, result);
        debug!("dispatch({}) -- {:?}: {}", self.request.kind(), step, ev.message());
        ev
    }

    /// Call the backend for a step, converting any failure into a failed
    /// result.
    fn call<F>(&self, step: SyncStep, op: F) -> SyncResult
        where F: FnOnce(&dyn SyncBackend) -> MResult<SyncResult>
    {
        let backend = self.dispatcher.backend.as_ref();
        match guarded(&format!("{:?}", step), || op(backend)) {
            Ok(x) => x,
            Err(e) => {
                warn!("dispatch({}) -- {:?}: {}", self.request.kind(), step, e);
                SyncResult::failed(status_for(step, &e))
            }
        }
    }

    /// Record a successful forms/cohorts sync. Failing to save the time is
    /// logged and otherwise ignored.
    fn save_sync_time(&self, kind: SyncKind, result: &SyncResult) {
        if !result.is_success() { return; }
        let now = util::now_millis();
        try_or!(self.dispatcher.timestamps.mark_synced(kind, now), e, {
            error!("dispatch::save_sync_time() -- {}: {}", kind, e)
        });
    }

    /// Queue steps to run next, ahead of anything already queued.
    fn run_next(&mut self, steps: Vec<Step>) {
        for step in steps.into_iter().rev() {
            self.steps.push_front(step);
        }
    }

    /// Authenticate. On failure the rest of the plan is dropped.
    fn authenticate(&mut self) -> Option<SyncStatusEvent> {
        let auth = self.dispatcher.auth.as_ref();
        let creds = self.request.credentials();
        let status = match guarded("authenticate", || auth.authenticate(creds)) {
            Ok(x) => x,
            Err(e) => {
                warn!("dispatch({}) -- authenticate: {}", self.request.kind(), e);
                status_for(SyncStep::Authenticate, &e)
            }
        };
        if status.is_success() {
            return None;
        }
        self.steps.clear();
        let message = match status {
            SyncStatus::AuthFailure => String::from("Authentication failed"),
            _ => format!("Authentication failed: {}", status),
        };
        Some(SyncStatusEvent::with_message(
            self.request.kind(),
            SyncStep::Authenticate,
            SyncResult::failed(SyncStatus::AuthFailure),
            message,
        ))
    }

    /// Consolidate patients after a cohort sync and queue a download for any
    /// that fell out of every cohort.
    fn reconcile(&mut self) -> Option<SyncStatusEvent> {
        let backend = self.dispatcher.backend.as_ref();
        let residual = guarded("reconcile", || {
            backend.consolidate_patients()?;
            backend.patients_not_in_cohorts()
        });
        match residual {
            Ok(uuids) => {
                if !uuids.is_empty() {
                    info!("dispatch({}) -- reconcile: {} patients outside any cohort", self.request.kind(), uuids.len());
                    self.run_next(vec![Step::Patients(uuids)]);
                }
                None
            }
            Err(e) => {
                warn!("dispatch({}) -- reconcile: {}", self.request.kind(), e);
                let result = SyncResult::failed(SyncStatus::LoadError);
                Some(self.event(SyncStep::Patients, result))
            }
        }
    }

    /// Run one step. Returns the event it produced, if any.
    fn run(&mut self, step: Step) -> Option<SyncStatusEvent> {
        match step {
            Step::Authenticate => self.authenticate(),
            Step::Forms => {
                let result = self.call(SyncStep::Forms, |b| b.download_forms());
                self.save_sync_time(SyncKind::Forms, &result);
                Some(self.event(SyncStep::Forms, result))
            }
            Step::Templates => {
                let result = self.call(SyncStep::Templates, |b| b.download_form_templates(self.request.ids()));
                Some(self.event(SyncStep::Templates, result))
            }
            Step::Cohorts => {
                let result = self.call(SyncStep::Cohorts, |b| b.download_cohorts());
                self.save_sync_time(SyncKind::Cohorts, &result);
                if result.is_success() {
                    self.run_next(vec![Step::Reconcile]);
                }
                Some(self.event(SyncStep::Cohorts, result))
            }
            Step::Reconcile => self.reconcile(),
            Step::CohortPatients { with_data } => {
                let result = self.call(SyncStep::Patients, |b| b.download_patients_for_cohorts(self.request.ids()));
                if with_data && result.is_success() {
                    self.run_next(vec![Step::CohortObservations, Step::CohortEncounters]);
                }
                Some(self.event(SyncStep::Patients, result))
            }
            Step::CohortObservations => {
                let result = self.call(SyncStep::Observations, |b| b.download_observations_for_cohorts(self.request.ids()));
                Some(self.event(SyncStep::Observations, result))
            }
            Step::CohortEncounters => {
                let result = self.call(SyncStep::Encounters, |b| b.download_encounters_for_cohorts(self.request.ids()));
                Some(self.event(SyncStep::Encounters, result))
            }
            Step::Patients(uuids) => {
                if uuids.is_empty() {
                    return None;
                }
                let result = self.call(SyncStep::Patients, |b| b.download_patients(&uuids));
                if result.is_success() {
                    self.run_next(vec![Step::PatientObservations(uuids.clone()), Step::PatientEncounters(uuids)]);
                }
                Some(self.event(SyncStep::Patients, result))
            }
            Step::PatientObservations(uuids) => {
                let result = self.call(SyncStep::Observations, |b| b.download_observations_for_patients(&uuids));
                Some(self.event(SyncStep::Observations, result))
            }
            Step::PatientEncounters(uuids) => {
                let result = self.call(SyncStep::Encounters, |b| b.download_encounters_for_patients(&uuids));
                Some(self.event(SyncStep::Encounters, result))
            }
            Step::UploadForms => {
                let result = self.call(SyncStep::UploadForms, |b| b.upload_completed_forms());
                // uploads report a status, never counts
                let result = SyncResult::status_only(result.status());
                Some(self.event(SyncStep::UploadForms, result))
            }
            Step::Notifications => {
                let receiver = self.request.receiver().unwrap_or("").to_owned();
                let result = self.call(SyncStep::Notifications, |b| b.download_notifications(&receiver));
                Some(self.event(SyncStep::Notifications, result))
            }
        }
    }
}

impl<'a> Iterator for Dispatch<'a> {
    type Item = SyncStatusEvent;

    fn next(&mut self) -> Option<SyncStatusEvent> {
        while let Some(step) = self.steps.pop_front() {
            if let Some(ev) = self.run(step) {
                return Some(ev);
            }
        }
        None
    }
}

impl<'a> FusedIterator for Dispatch<'a> {}
