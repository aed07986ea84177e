extern crate carrier;
extern crate config;
extern crate jedi;
extern crate muzima_core;
#[macro_use]
extern crate serde_json;

use ::std::thread;
use ::std::sync::Arc;
use ::jedi::Value;
use ::muzima_core::error::{MError, MResult};
use ::muzima_core::sync::{Authenticator, Credentials, SyncBackend, SyncResult, SyncStatus};

/// Lets in anyone whose password is "Admin123"
pub struct Auth;

impl Authenticator for Auth {
    fn authenticate(&self, credentials: &Credentials) -> MResult<SyncStatus> {
        if credentials.password == "Admin123" {
            Ok(SyncStatus::Success)
        } else {
            Ok(SyncStatus::AuthFailure)
        }
    }
}

/// A backend that always has a little something to download. Cohort id
/// "offline" makes the cohort patient download fail like the server is gone.
pub struct Backend;

impl SyncBackend for Backend {
    fn download_forms(&self) -> MResult<SyncResult> {
        Ok(SyncResult::success(3, None))
    }
    fn download_form_templates(&self, form_ids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(form_ids.len() as u32, Some(12)))
    }
    fn download_cohorts(&self) -> MResult<SyncResult> {
        Ok(SyncResult::success(2, Some(0)))
    }
    fn download_patients_for_cohorts(&self, cohort_ids: &[String]) -> MResult<SyncResult> {
        if cohort_ids.iter().any(|x| x == "offline") {
            return Err(MError::Network(String::from("connection refused")));
        }
        Ok(SyncResult::success(5, None))
    }
    fn download_patients(&self, patient_uuids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(patient_uuids.len() as u32, None))
    }
    fn download_observations_for_cohorts(&self, _cohort_ids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(40, Some(2)))
    }
    fn download_encounters_for_cohorts(&self, _cohort_ids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(8, Some(1)))
    }
    fn download_observations_for_patients(&self, _patient_uuids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(4, Some(0)))
    }
    fn download_encounters_for_patients(&self, _patient_uuids: &[String]) -> MResult<SyncResult> {
        Ok(SyncResult::success(1, Some(0)))
    }
    fn upload_completed_forms(&self) -> MResult<SyncResult> {
        Ok(SyncResult::status_only(SyncStatus::Success))
    }
    fn download_notifications(&self, _receiver_uuid: &str) -> MResult<SyncResult> {
        Ok(SyncResult::success(6, None))
    }
    fn consolidate_patients(&self) -> MResult<()> {
        Ok(())
    }
    fn patients_not_in_cohorts(&self) -> MResult<Vec<String>> {
        Ok(vec![String::from("p-lost")])
    }
}

pub fn init() -> thread::JoinHandle<()> {
    carrier::wipe();
    muzima_core::init(String::from(r#"{"loglevel":"warn"}"#)).unwrap();
    muzima_core::start(Arc::new(Auth), Arc::new(Backend)).unwrap()
}

/// Shut the core down, handing back every event it sent that nobody read
pub fn end(handle: thread::JoinHandle<()>) -> Vec<Value> {
    send(json!(["4269", "app:shutdown"]));
    handle.join().unwrap();
    let mut leftover = Vec::new();
    while let Some(ev) = muzima_core::recv_event_nb().unwrap() {
        leftover.push(jedi::parse(&ev).unwrap());
    }
    carrier::wipe();
    leftover
}

pub fn creds(password: &str) -> Value {
    json!({"username": "admin", "password": password, "server": "https://demo.muzima.org"})
}

pub fn send(msg: Value) {
    muzima_core::send(jedi::stringify(&msg).unwrap()).unwrap();
}

pub fn send_raw(msg: &str) {
    muzima_core::send(String::from(msg)).unwrap();
}

/// Block until we get an event with the given name, returning its data
pub fn wait_on(evname: &str) -> Value {
    loop {
        let ev = muzima_core::recv_event().unwrap();
        let parsed: Value = jedi::parse(&ev).unwrap();
        let parsed_evname: String = jedi::get(&["e"], &parsed).unwrap();
        if parsed_evname == evname {
            return jedi::get(&["d"], &parsed).unwrap();
        }
    }
}

pub fn get_str(keys: &[&str], val: &Value) -> String {
    jedi::get(keys, val).unwrap()
}
