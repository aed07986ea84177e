//! Messaging is how the host app and the core talk. Requests come in on one
//! carrier channel as JSON, sync events go back out on another. Nobody has to
//! hold a reference to anybody else.
//!
//! Incoming messages look like `["<message id>", "<command>", {args}]`.
//! Outgoing events look like `{"e": "<event name>", "d": <data>}`.

use ::std::sync::Arc;
use ::std::thread;

use ::crossbeam::channel::{self, Sender};
use ::jedi::{self, Value, Serialize};

use crate::error::{MError, MResult};
use crate::sync::backend::EventSink;
use crate::sync::request::{Credentials, SyncKind, SyncRequest};
use crate::sync::status::{ProgressNotice, SyncStatusEvent};
use crate::util::event::{Emitter, EventEmitter};

/// Event name for per-step sync events
pub const EV_STATUS: &str = "sync:status";
/// Event name for progress notices
pub const EV_PROGRESS: &str = "sync:progress";

/// An event on its way to the UI
#[derive(Serialize, Debug)]
pub struct Event<'a, T: Serialize + 'a> {
    e: &'a str,
    d: &'a T,
}

/// Send an event out to the UI on the configured events channel
pub fn ui_event<T: Serialize>(name: &str, data: &T) -> MResult<()> {
    let channel: String = config::get(&["messaging", "events"])?;
    let msg = jedi::stringify(&Event { e: name, d: data })?;
    debug!("messaging::ui_event() -- {}", name);
    carrier::send_string(&channel, msg)?;
    Ok(())
}

/// Pushes sync events onto the events channel as JSON.
pub struct CarrierSink;

impl EventSink for CarrierSink {
    fn publish(&self, event: &SyncStatusEvent) {
        try_or!(ui_event(EV_STATUS, event), e, {
            warn!("CarrierSink::publish() -- problem sending event: {}", e)
        });
    }

    fn progress(&self, notice: &ProgressNotice) {
        try_or!(ui_event(EV_PROGRESS, notice), e, {
            warn!("CarrierSink::progress() -- problem sending notice: {}", e)
        });
    }
}

/// Triggers sync events on an `EventEmitter`, for observers living in the
/// same process. Callbacks run on the sink's own delivery thread, in the order
/// events were published, so a slow observer never holds up the sync worker.
/// The delivery thread exits once the sink is dropped and its queue is empty.
pub struct EmitterSink {
    tx: Sender<(&'static str, Value)>,
}

impl EmitterSink {
    pub fn new(emitter: Arc<EventEmitter>) -> MResult<EmitterSink> {
        let (tx, rx) = channel::unbounded::<(&'static str, Value)>();
        thread::Builder::new().name(String::from("sync:emitter")).spawn(move || {
            while let Ok((name, data)) = rx.recv() {
                emitter.trigger(name, &data);
            }
            debug!("EmitterSink -- delivery thread done");
        })?;
        Ok(EmitterSink { tx: tx })
    }

    fn trigger<T: Serialize>(&self, name: &'static str, data: &T) {
        let val = match jedi::to_val(data) {
            Ok(x) => x,
            Err(e) => {
                warn!("EmitterSink::trigger() -- {}: problem serializing: {}", name, e);
                return;
            }
        };
        if let Err(e) = self.tx.send((name, val)) {
            warn!("EmitterSink::trigger() -- {}: delivery thread is gone: {}", name, e);
        }
    }
}

impl EventSink for EmitterSink {
    fn publish(&self, event: &SyncStatusEvent) {
        self.trigger(EV_STATUS, event);
    }

    fn progress(&self, notice: &ProgressNotice) {
        self.trigger(EV_PROGRESS, notice);
    }
}

/// What an incoming message asks us to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Sync(SyncRequest),
    Shutdown,
}

/// Grab a required arg, with a sane error if it's missing.
fn arg<T: jedi::DeserializeOwned>(args: &Value, key: &str, cmd: &str) -> MResult<T> {
    jedi::get(&[key], args)
        .map_err(|_| MError::MissingField(format!("{}: `{}`", cmd, key)))
}

/// Turn an incoming message into its message id and a command.
pub fn parse_message(msg: &str) -> MResult<(String, Command)> {
    let data: Value = jedi::parse(msg)?;
    let mid: String = jedi::get(&["0"], &data)
        .map_err(|_| MError::MissingField(String::from("message id")))?;
    let cmd: String = jedi::get(&["1"], &data)
        .map_err(|_| MError::MissingField(String::from("command")))?;
    let args: Value = jedi::get_opt(&["2"], &data).unwrap_or_else(jedi::obj);

    if cmd == "app:shutdown" {
        return Ok((mid, Command::Shutdown));
    }
    let kind = match SyncKind::from_command(&cmd) {
        Some(x) => x,
        None => return Err(MError::MissingCommand(cmd)),
    };
    let creds: Credentials = arg(&args, "credentials", &cmd)?;
    let request = match kind {
        SyncKind::Forms => SyncRequest::forms(creds),
        SyncKind::Templates => SyncRequest::templates(creds, arg(&args, "form_ids", &cmd)?),
        SyncKind::Cohorts => SyncRequest::cohorts(creds),
        SyncKind::PatientsFull => SyncRequest::patients_full(creds, arg(&args, "cohort_ids", &cmd)?),
        SyncKind::PatientsOnly => SyncRequest::patients_only(creds, arg(&args, "cohort_ids", &cmd)?),
        SyncKind::PatientsDataOnly => SyncRequest::patients_data_only(creds, arg(&args, "cohort_ids", &cmd)?),
        SyncKind::UploadForms => SyncRequest::upload_forms(creds),
        SyncKind::DownloadPatientOnly => SyncRequest::download_patients(creds, arg(&args, "patient_uuids", &cmd)?),
        SyncKind::Notifications => {
            let receiver: String = arg(&args, "receiver_uuid", &cmd)?;
            let cohort_ids: Vec<String> = jedi::get_opt(&["cohort_ids"], &args).unwrap_or_default();
            SyncRequest::notifications(creds, &receiver, cohort_ids)
        }
    };
    Ok((mid, Command::Sync(request)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::status::{SyncResult, SyncStatus, SyncStep};

    const CREDS: &str = r#"{"username":"admin","password":"Admin123","server":"https://demo.muzima.org"}"#;

    #[test]
    fn parses_sync_commands() {
        let msg = format!(r#"["12","sync:patients-full",{{"credentials":{},"cohort_ids":["c1","c2"]}}]"#, CREDS);
        let (mid, cmd) = parse_message(&msg).unwrap();
        assert_eq!(mid, "12");
        match cmd {
            Command::Sync(req) => {
                assert_eq!(req.kind(), SyncKind::PatientsFull);
                assert_eq!(req.ids(), &[String::from("c1"), String::from("c2")]);
                assert_eq!(req.credentials().username, "admin");
                assert_eq!(req.credentials().server, Some(String::from("https://demo.muzima.org")));
            }
            _ => panic!("expected a sync command"),
        }

        let msg = format!(r#"["13","sync:notifications",{{"credentials":{},"receiver_uuid":"r1"}}]"#, CREDS);
        let (_, cmd) = parse_message(&msg).unwrap();
        match cmd {
            Command::Sync(req) => {
                assert_eq!(req.kind(), SyncKind::Notifications);
                assert_eq!(req.receiver(), Some("r1"));
                assert!(req.ids().is_empty());
            }
            _ => panic!("expected a sync command"),
        }

        let (mid, cmd) = parse_message(r#"["14","app:shutdown"]"#).unwrap();
        assert_eq!(mid, "14");
        assert_eq!(cmd, Command::Shutdown);
    }

    #[test]
    fn rejects_bad_messages() {
        match parse_message(r#"["1","sync:everything",{}]"#) {
            Err(MError::MissingCommand(cmd)) => assert_eq!(cmd, "sync:everything"),
            x => panic!("unexpected: {:?}", x),
        }
        match parse_message(r#"["1","sync:forms",{}]"#) {
            Err(MError::MissingField(field)) => assert!(field.contains("credentials")),
            x => panic!("unexpected: {:?}", x),
        }
        let msg = format!(r#"["1","sync:download-patients",{{"credentials":{}}}]"#, CREDS);
        match parse_message(&msg) {
            Err(MError::MissingField(field)) => assert!(field.contains("patient_uuids")),
            x => panic!("unexpected: {:?}", x),
        }
        assert!(parse_message(r#"["1"]"#).is_err());
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn emitter_sink_triggers() {
        let emitter = Arc::new(EventEmitter::new());
        let (seen_tx, seen_rx) = channel::unbounded::<String>();
        emitter.bind(EV_STATUS, move |data: &Value| {
            let msg: String = jedi::get(&["message"], data).unwrap();
            seen_tx.send(msg).unwrap();
        }, "test:status");

        let sink = EmitterSink::new(emitter.clone()).unwrap();
        sink.publish(&SyncStatusEvent::new(SyncKind::Forms, SyncStep::Forms, SyncResult::success(3, None)));
        sink.progress(&ProgressNotice::running("not a status"));
        sink.publish(&SyncStatusEvent::new(SyncKind::Forms, SyncStep::Forms, SyncResult::failed(SyncStatus::NetworkError)));
        assert_eq!(seen_rx.recv().unwrap(), "Downloaded 3 forms");
        assert_eq!(seen_rx.recv().unwrap(), "Downloading forms failed: network error");
        assert!(seen_rx.try_recv().is_err());
    }

    #[test]
    fn slow_observers_dont_block_publishing() {
        let emitter = Arc::new(EventEmitter::new());
        let (gate_tx, gate_rx) = channel::unbounded::<()>();
        let (seen_tx, seen_rx) = channel::unbounded::<String>();
        emitter.bind(EV_STATUS, move |data: &Value| {
            // hold the delivery thread until the test lets go
            gate_rx.recv().unwrap();
            seen_tx.send(jedi::get(&["message"], data).unwrap()).unwrap();
        }, "test:slow");

        let sink = EmitterSink::new(emitter.clone()).unwrap();
        // if publishing waited on the observer, we'd hang right here
        sink.publish(&SyncStatusEvent::new(SyncKind::Forms, SyncStep::Forms, SyncResult::success(1, None)));
        sink.publish(&SyncStatusEvent::new(SyncKind::Forms, SyncStep::Forms, SyncResult::success(2, None)));
        assert!(seen_rx.try_recv().is_err());

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        assert_eq!(seen_rx.recv().unwrap(), "Downloaded 1 forms");
        assert_eq!(seen_rx.recv().unwrap(), "Downloaded 2 forms");
    }
}
