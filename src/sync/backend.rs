//! The seams between the sync core and the outside world. The host app plugs
//! in its own authenticator, backend (HTTP + local persistence), sinks and
//! timestamp store; the core only ever talks to these traits.

use ::crossbeam::channel::Sender;

use crate::error::MResult;
use crate::sync::request::{Credentials, SyncKind};
use crate::sync::status::{SyncStatus, SyncResult, SyncStatusEvent, ProgressNotice};

/// Checks credentials against the server (or a local cache of them).
pub trait Authenticator: Send + Sync {
    /// `SyncStatus::Success` means authenticated. Anything else is reported
    /// as an authentication failure.
    fn authenticate(&self, credentials: &Credentials) -> MResult<SyncStatus>;
}

/// Everything the sync core can ask of the backend. Each download/upload call
/// does its own fetching and storing and reports a `SyncResult`.
pub trait SyncBackend: Send + Sync {
    fn download_forms(&self) -> MResult<SyncResult>;

    /// primary = templates, secondary = concepts
    fn download_form_templates(&self, form_ids: &[String]) -> MResult<SyncResult>;

    /// primary = new cohorts, secondary = deleted cohorts
    fn download_cohorts(&self) -> MResult<SyncResult>;

    fn download_patients_for_cohorts(&self, cohort_ids: &[String]) -> MResult<SyncResult>;

    fn download_patients(&self, patient_uuids: &[String]) -> MResult<SyncResult>;

    fn download_observations_for_cohorts(&self, cohort_ids: &[String]) -> MResult<SyncResult>;

    fn download_encounters_for_cohorts(&self, cohort_ids: &[String]) -> MResult<SyncResult>;

    fn download_observations_for_patients(&self, patient_uuids: &[String]) -> MResult<SyncResult>;

    fn download_encounters_for_patients(&self, patient_uuids: &[String]) -> MResult<SyncResult>;

    fn upload_completed_forms(&self) -> MResult<SyncResult>;

    fn download_notifications(&self, receiver_uuid: &str) -> MResult<SyncResult>;

    /// Merge local patient records with what came down with the cohorts.
    fn consolidate_patients(&self) -> MResult<()>;

    /// Uuids of downloaded patients that no longer belong to any cohort.
    fn patients_not_in_cohorts(&self) -> MResult<Vec<String>>;
}

/// Where sync events go. Publishing is fire-and-forget: sinks swallow (and
/// log) their own errors.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &SyncStatusEvent);

    fn progress(&self, _notice: &ProgressNotice) {}
}

impl EventSink for Sender<SyncStatusEvent> {
    fn publish(&self, event: &SyncStatusEvent) {
        if let Err(e) = self.send(event.clone()) {
            warn!("EventSink::publish() -- channel receiver is gone: {}", e);
        }
    }
}

/// Remembers when a kind of sync last succeeded.
pub trait TimestampStore: Send + Sync {
    /// Milliseconds since the epoch, or None if never synced (or not tracked)
    fn last_synced(&self, kind: SyncKind) -> MResult<Option<i64>>;

    fn mark_synced(&self, kind: SyncKind, at: i64) -> MResult<()>;
}
