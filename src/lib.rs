extern crate carrier;
extern crate config;
extern crate crossbeam;
extern crate fern;
extern crate jedi;
#[macro_use]
extern crate log;
extern crate log_panics;
#[macro_use]
extern crate quick_error;
extern crate rusqlite;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate time;

#[macro_use]
pub mod error;
#[macro_use]
pub mod util;
pub mod sync;
pub mod storage;
pub mod messaging;
pub mod dashboard;

use ::std::thread;
use ::std::sync::Arc;

use ::jedi::Value;

use crate::error::MResult;
use crate::messaging::{CarrierSink, Command};
use crate::storage::Storage;
use crate::sync::backend::{Authenticator, SyncBackend};
use crate::sync::dispatch::SyncDispatcher;
use crate::sync::service::SyncService;

/// Name of the main message-loop thread
const MAIN_THREAD: &str = "muzima-main";

/// Init any state/logging/etc the app needs. `config_str` is a JSON object
/// that gets merged over our app config (it may also name a `config_file` to
/// load first).
pub fn init(config_str: String) -> MResult<()> {
    let runtime_config: Value = match jedi::parse(&config_str) {
        Ok(x) => x,
        Err(e) => {
            println!("Problem parsing runtime config: {}", e);
            jedi::obj()
        }
    };
    let config_location: Option<String> = jedi::get_opt(&["config_file"], &runtime_config);
    config::load_config(config_location)?;
    config::merge(&runtime_config)?;
    match util::logger::setup_logger() {
        Ok(_) => {}
        Err(e) => {
            println!("Problem setting up logging: {}", e);
            return Err(e);
        }
    }
    Ok(())
}

/// Run the message loop until we get an `app:shutdown`. Bad messages are
/// logged and skipped.
fn run_loop(service: &SyncService) -> MResult<()> {
    let channel: String = config::get(&["messaging", "requests"])?;
    info!("main::run_loop() -- listening on {}", channel);
    loop {
        let msg = String::from_utf8(carrier::recv(&channel)?)?;
        let (mid, cmd) = match messaging::parse_message(&msg) {
            Ok(x) => x,
            Err(e) => {
                error!("main::run_loop() -- bad message: {}", e);
                continue;
            }
        };
        match cmd {
            Command::Shutdown => {
                info!("main::run_loop() -- got shutdown ({})", mid);
                break;
            }
            Command::Sync(request) => {
                info!("main::run_loop() -- {}: {}", mid, request.kind());
                try_or!(service.submit(request), e, {
                    error!("main::run_loop() -- {}: problem queuing request: {}", mid, e)
                });
            }
        }
    }
    Ok(())
}

/// Start the core. Opens our storage, spins up the sync worker and listens
/// for requests on the `messaging.requests` channel. The returned thread
/// exits once an `app:shutdown` message comes through and every queued
/// request has finished.
pub fn start(auth: Arc<dyn Authenticator>, backend: Arc<dyn SyncBackend>) -> MResult<thread::JoinHandle<()>> {
    let storage_path: String = config::get(&["storage", "path"])?;
    let storage = Arc::new(Storage::new(&storage_path)?);
    let dispatcher = SyncDispatcher::new(auth, backend, storage);

    let handle = thread::Builder::new().name(String::from(MAIN_THREAD)).spawn(move || {
        let runner = move || -> MResult<()> {
            let mut service = SyncService::start(dispatcher, Arc::new(CarrierSink))?;
            let res = run_loop(&service);
            service.shutdown()?;
            res
        };
        match runner() {
            Ok(_) => info!("main::start() -- shut down"),
            Err(e) => error!("main::start() -- {}", e),
        }
    })?;
    Ok(handle)
}

/// Send a message into the core's request channel
pub fn send(msg: String) -> MResult<()> {
    let channel: String = config::get(&["messaging", "requests"])?;
    carrier::send_string(channel.as_str(), msg)?;
    Ok(())
}

/// Block until the next event comes out of the core
pub fn recv_event() -> MResult<String> {
    let channel: String = config::get(&["messaging", "events"])?;
    let msg = carrier::recv(channel.as_str())?;
    Ok(String::from_utf8(msg)?)
}

/// Grab the next event, if there is one
pub fn recv_event_nb() -> MResult<Option<String>> {
    let channel: String = config::get(&["messaging", "events"])?;
    match carrier::recv_nb(channel.as_str())? {
        Some(x) => Ok(Some(String::from_utf8(x)?)),
        None => Ok(None),
    }
}
