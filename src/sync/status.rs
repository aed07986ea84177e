//! What comes out of a sync: per-step results, the events we publish for
//! them, and the progress notices that stand in for the old tray
//! notification.

use ::std::fmt;

use crate::sync::request::SyncKind;

/// Outcome codes for a sync step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    AuthFailure,
    NetworkError,
    DownloadError,
    SaveError,
    DeleteError,
    UploadError,
    LoadError,
    PartialFailure,
}

impl SyncStatus {
    pub fn is_success(&self) -> bool {
        *self == SyncStatus::Success
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let desc = match *self {
            SyncStatus::Success => "success",
            SyncStatus::AuthFailure => "authentication failure",
            SyncStatus::NetworkError => "network error",
            SyncStatus::DownloadError => "download error",
            SyncStatus::SaveError => "save error",
            SyncStatus::DeleteError => "delete error",
            SyncStatus::UploadError => "upload error",
            SyncStatus::LoadError => "load error",
            SyncStatus::PartialFailure => "partial failure",
        };
        write!(f, "{}", desc)
    }
}

/// The result of one sub-operation. Counts only exist on success: building a
/// failed result throws them away, so a failed step can never report record
/// counts.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SyncResult {
    status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary: Option<u32>,
}

impl SyncResult {
    /// Build a result from what a backend reported.
    pub fn new(status: SyncStatus, primary: u32, secondary: Option<u32>) -> SyncResult {
        if status.is_success() {
            SyncResult::success(primary, secondary)
        } else {
            SyncResult::failed(status)
        }
    }

    pub fn success(primary: u32, secondary: Option<u32>) -> SyncResult {
        SyncResult {
            status: SyncStatus::Success,
            primary: Some(primary),
            secondary: secondary,
        }
    }

    /// A failed step. Never has counts.
    pub fn failed(status: SyncStatus) -> SyncResult {
        debug_assert!(!status.is_success(), "SyncResult::failed() -- given a success status");
        SyncResult::status_only(status)
    }

    /// Keep a step's status and drop its counts, success or not. For steps
    /// that never report counts (uploads).
    pub fn status_only(status: SyncStatus) -> SyncResult {
        SyncResult {
            status: status,
            primary: None,
            secondary: None,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Main count (records downloaded, etc). None on failure.
    pub fn primary(&self) -> Option<u32> {
        self.primary
    }

    /// Related count (records deleted, concepts, ...). None on failure or if
    /// the backend didn't report one.
    pub fn secondary(&self) -> Option<u32> {
        self.secondary
    }
}

/// The sub-operation an event reports on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    Authenticate,
    Forms,
    Templates,
    Cohorts,
    Patients,
    Observations,
    Encounters,
    UploadForms,
    Notifications,
}

impl SyncStep {
    fn action(&self) -> &'static str {
        match *self {
            SyncStep::Authenticate => "Authentication",
            SyncStep::Forms => "Downloading forms",
            SyncStep::Templates => "Downloading form templates",
            SyncStep::Cohorts => "Downloading cohorts",
            SyncStep::Patients => "Downloading patients",
            SyncStep::Observations => "Downloading observations",
            SyncStep::Encounters => "Downloading encounters",
            SyncStep::UploadForms => "Uploading forms",
            SyncStep::Notifications => "Downloading notifications",
        }
    }

    /// The status a step reports when its collaborator blows up.
    pub fn failure_status(&self) -> SyncStatus {
        match *self {
            SyncStep::Authenticate => SyncStatus::AuthFailure,
            SyncStep::UploadForms => SyncStatus::UploadError,
            _ => SyncStatus::DownloadError,
        }
    }

    /// Human-readable summary of a result for this step.
    pub fn describe(&self, result: &SyncResult) -> String {
        if !result.is_success() {
            return format!("{} failed: {}", self.action(), result.status());
        }
        let primary = result.primary().unwrap_or(0);
        let secondary = result.secondary().unwrap_or(0);
        match *self {
            SyncStep::Authenticate => String::from("Authenticated"),
            SyncStep::Forms => format!("Downloaded {} forms", primary),
            SyncStep::Templates => format!("Downloaded {} form templates and {} concepts", primary, secondary),
            SyncStep::Cohorts => format!("Downloaded {} new cohorts; and deleted {} cohorts", primary, secondary),
            SyncStep::Patients => format!("Downloaded {} new patients", primary),
            SyncStep::Observations => format!("Downloaded {} new observations; and deleted {} observations", primary, secondary),
            SyncStep::Encounters => format!("Downloaded {} new encounters; and deleted {} encounters", primary, secondary),
            SyncStep::UploadForms => String::from("Uploaded the forms successfully"),
            SyncStep::Notifications => format!("Downloaded {} notifications", primary),
        }
    }
}

/// Published once per sub-step.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SyncStatusEvent {
    kind: SyncKind,
    step: SyncStep,
    #[serde(flatten)]
    result: SyncResult,
    message: String,
}

impl SyncStatusEvent {
    /// Create an event with the step's standard message
    pub fn new(kind: SyncKind, step: SyncStep, result: SyncResult) -> SyncStatusEvent {
        let message = step.describe(&result);
        SyncStatusEvent::with_message(kind, step, result, message)
    }

    pub fn with_message(kind: SyncKind, step: SyncStep, result: SyncResult, message: String) -> SyncStatusEvent {
        SyncStatusEvent {
            kind: kind,
            step: step,
            result: result,
            message: message,
        }
    }

    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    pub fn step(&self) -> SyncStep {
        self.step
    }

    pub fn result(&self) -> &SyncResult {
        &self.result
    }

    pub fn status(&self) -> SyncStatus {
        self.result.status()
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Running,
    Finished,
}

/// A one-line status update, the kind of thing a host shows in a
/// notification.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressNotice {
    pub state: ProgressState,
    pub title: &'static str,
    pub message: String,
}

impl ProgressNotice {
    pub fn running(message: &str) -> ProgressNotice {
        ProgressNotice {
            state: ProgressState::Running,
            title: "Muzima Sync Service Running",
            message: String::from(message),
        }
    }

    pub fn finished(message: &str) -> ProgressNotice {
        ProgressNotice {
            state: ProgressState::Finished,
            title: "Muzima Sync Service Finished",
            message: String::from(message),
        }
    }
}

/// Everything one dispatch emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub kind: SyncKind,
    pub events: Vec<SyncStatusEvent>,
}

impl DispatchReport {
    /// Overall status: success if nothing failed, the failing status if
    /// nothing succeeded, partial failure for a mix.
    pub fn status(&self) -> SyncStatus {
        let failed: Vec<&SyncStatusEvent> = self.events.iter()
            .filter(|ev| !ev.result().is_success())
            .collect();
        if failed.is_empty() {
            SyncStatus::Success
        } else if failed.len() == self.events.len() {
            failed[0].status()
        } else {
            SyncStatus::PartialFailure
        }
    }
}
