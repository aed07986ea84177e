//! Sync requests: what the host wants synced, and who is asking.

use ::std::fmt;

/// The kinds of sync a host can ask for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Forms,
    Templates,
    Cohorts,
    PatientsFull,
    PatientsOnly,
    PatientsDataOnly,
    UploadForms,
    DownloadPatientOnly,
    Notifications,
}

impl SyncKind {
    /// The messaging command that maps to this kind
    pub fn command(&self) -> &'static str {
        match *self {
            SyncKind::Forms => "sync:forms",
            SyncKind::Templates => "sync:templates",
            SyncKind::Cohorts => "sync:cohorts",
            SyncKind::PatientsFull => "sync:patients-full",
            SyncKind::PatientsOnly => "sync:patients-only",
            SyncKind::PatientsDataOnly => "sync:patients-data",
            SyncKind::UploadForms => "sync:upload-forms",
            SyncKind::DownloadPatientOnly => "sync:download-patients",
            SyncKind::Notifications => "sync:notifications",
        }
    }

    /// Reverse of `command()`
    pub fn from_command(cmd: &str) -> Option<SyncKind> {
        let kind = match cmd {
            "sync:forms" => SyncKind::Forms,
            "sync:templates" => SyncKind::Templates,
            "sync:cohorts" => SyncKind::Cohorts,
            "sync:patients-full" => SyncKind::PatientsFull,
            "sync:patients-only" => SyncKind::PatientsOnly,
            "sync:patients-data" => SyncKind::PatientsDataOnly,
            "sync:upload-forms" => SyncKind::UploadForms,
            "sync:download-patients" => SyncKind::DownloadPatientOnly,
            "sync:notifications" => SyncKind::Notifications,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Opaque credentials, handed straight to the authenticator.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub server: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str, server: Option<&str>) -> Credentials {
        Credentials {
            username: String::from(username),
            password: String::from(password),
            server: server.map(String::from),
        }
    }
}

// never let the password near a log line
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

/// One sync request. Built through the per-kind constructors and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    kind: SyncKind,
    credentials: Credentials,
    /// form ids, cohort ids or patient uuids, depending on `kind`
    ids: Vec<String>,
    receiver: Option<String>,
}

impl SyncRequest {
    fn new(kind: SyncKind, credentials: Credentials, ids: Vec<String>, receiver: Option<String>) -> SyncRequest {
        SyncRequest {
            kind: kind,
            credentials: credentials,
            ids: ids,
            receiver: receiver,
        }
    }

    pub fn forms(credentials: Credentials) -> SyncRequest {
        SyncRequest::new(SyncKind::Forms, credentials, Vec::new(), None)
    }

    pub fn templates(credentials: Credentials, form_ids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::Templates, credentials, form_ids, None)
    }

    pub fn cohorts(credentials: Credentials) -> SyncRequest {
        SyncRequest::new(SyncKind::Cohorts, credentials, Vec::new(), None)
    }

    pub fn patients_full(credentials: Credentials, cohort_ids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::PatientsFull, credentials, cohort_ids, None)
    }

    pub fn patients_only(credentials: Credentials, cohort_ids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::PatientsOnly, credentials, cohort_ids, None)
    }

    pub fn patients_data_only(credentials: Credentials, cohort_ids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::PatientsDataOnly, credentials, cohort_ids, None)
    }

    pub fn upload_forms(credentials: Credentials) -> SyncRequest {
        SyncRequest::new(SyncKind::UploadForms, credentials, Vec::new(), None)
    }

    pub fn download_patients(credentials: Credentials, patient_uuids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::DownloadPatientOnly, credentials, patient_uuids, None)
    }

    pub fn notifications(credentials: Credentials, receiver_uuid: &str, cohort_ids: Vec<String>) -> SyncRequest {
        SyncRequest::new(SyncKind::Notifications, credentials, cohort_ids, Some(String::from(receiver_uuid)))
    }

    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn ids(&self) -> &[String] {
        &self.ids[..]
    }

    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_ref().map(|x| x.as_str())
    }

    /// The status line shown while this request runs.
    pub fn start_message(&self) -> String {
        match self.kind {
            SyncKind::Forms => String::from("Downloading Forms Metadata"),
            SyncKind::Templates => format!("Downloading Forms Template for {} forms", self.ids.len()),
            SyncKind::Cohorts => String::from("Downloading Cohorts"),
            SyncKind::PatientsFull | SyncKind::PatientsOnly | SyncKind::DownloadPatientOnly => {
                String::from("Downloading Patients")
            }
            SyncKind::PatientsDataOnly => String::from("Downloading Patients data"),
            SyncKind::UploadForms => String::from("Uploading Forms"),
            SyncKind::Notifications => {
                format!("Downloading Notifications for receiver {}", self.receiver().unwrap_or(""))
            }
        }
    }
}
