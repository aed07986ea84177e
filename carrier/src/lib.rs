//! Carrier is a set of named, in-process message queues. The core pushes
//! serialized events onto them and the host UI (or a test) pulls them off,
//! without either side having to hold a reference to the other.

extern crate crossbeam;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate quick_error;

mod error;

use ::std::sync::RwLock;
use ::std::collections::HashMap;
use ::std::time::Duration;

use ::crossbeam::channel::{unbounded, Sender, Receiver, RecvTimeoutError, TryRecvError};

pub use crate::error::CError;
use crate::error::CResult;

lazy_static! {
    static ref CONN: Carrier = Carrier::new();
}

type Queue = (Sender<Vec<u8>>, Receiver<Vec<u8>>);

pub struct Carrier {
    queues: RwLock<HashMap<String, Queue>>,
}

impl Carrier {
    /// Create a new carrier
    pub fn new() -> Carrier {
        Carrier {
            queues: RwLock::new(HashMap::new()),
        }
    }

    /// Ensure a channel exists, handing back both of its ends
    pub fn ensure(&self, channel: &str) -> CResult<Queue> {
        {
            let guard = self.queues.read().map_err(|_| CError::Msg(String::from("queue lock poisoned")))?;
            if let Some(queue) = guard.get(channel) {
                return Ok(queue.clone());
            }
        }
        let mut guard = self.queues.write().map_err(|_| CError::Msg(String::from("queue lock poisoned")))?;
        let queue = guard.entry(String::from(channel)).or_insert_with(unbounded);
        Ok(queue.clone())
    }

    /// Drop every channel. Anyone blocked in a recv gets a disconnect.
    pub fn wipe(&self) {
        match self.queues.write() {
            Ok(mut guard) => guard.clear(),
            Err(_) => {}
        }
    }
}

impl Default for Carrier {
    fn default() -> Carrier {
        Carrier::new()
    }
}

/// Send a message on a channel
pub fn send(channel: &str, message: Vec<u8>) -> CResult<()> {
    let (tx, _) = CONN.ensure(channel)?;
    tx.send(message).map_err(|_| CError::Disconnected(String::from(channel)))
}

/// Send a string message on a channel
pub fn send_string(channel: &str, message: String) -> CResult<()> {
    send(channel, message.into_bytes())
}

/// Blocking receive
pub fn recv(channel: &str) -> CResult<Vec<u8>> {
    let (_, rx) = CONN.ensure(channel)?;
    rx.recv().map_err(|_| CError::Disconnected(String::from(channel)))
}

/// Non-blocking receive
pub fn recv_nb(channel: &str) -> CResult<Option<Vec<u8>>> {
    let (_, rx) = CONN.ensure(channel)?;
    match rx.try_recv() {
        Ok(x) => Ok(Some(x)),
        Err(TryRecvError::Empty) => Ok(None),
        Err(TryRecvError::Disconnected) => Err(CError::Disconnected(String::from(channel))),
    }
}

/// Receive, giving up after `millis`
pub fn recv_timeout(channel: &str, millis: u64) -> CResult<Vec<u8>> {
    let (_, rx) = CONN.ensure(channel)?;
    match rx.recv_timeout(Duration::from_millis(millis)) {
        Ok(x) => Ok(x),
        Err(RecvTimeoutError::Timeout) => Err(CError::Timeout(String::from(channel))),
        Err(RecvTimeoutError::Disconnected) => Err(CError::Disconnected(String::from(channel))),
    }
}

/// Clear out all channels
pub fn wipe() {
    CONN.wipe();
}

#[cfg(test)]
mod tests {
    use ::std::thread;

    use super::*;

    #[test]
    fn send_recv_simple() {
        send("messages", Vec::from(String::from("this is a test").as_bytes())).unwrap();
        send_string("messages", String::from("this is another test")).unwrap();

        let next = String::from_utf8(recv_nb("messages").unwrap().unwrap()).unwrap();
        assert_eq!(next, "this is a test");
        let next = String::from_utf8(recv_nb("messages").unwrap().unwrap()).unwrap();
        assert_eq!(next, "this is another test");
        let next = recv_nb("messages").unwrap();
        assert_eq!(next, None);
        let next = recv_nb("nope").unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn recv_blocking() {
        let handle = thread::spawn(move || {
            send_string("core", String::from("hello, there")).unwrap();
        });
        let msg = String::from_utf8(recv("core").unwrap()).unwrap();
        assert_eq!(msg, "hello, there");
        handle.join().unwrap();
    }

    #[test]
    fn recv_times_out() {
        match recv_timeout("quiet", 10) {
            Err(CError::Timeout(ch)) => assert_eq!(ch, "quiet"),
            x => panic!("expected timeout, got {:?}", x),
        }
    }

    #[test]
    fn local_carrier_wipes() {
        let carrier = Carrier::new();
        let (tx, _) = carrier.ensure("local").unwrap();
        tx.send(vec![1, 2, 3]).unwrap();
        carrier.wipe();
        let (_, rx) = carrier.ensure("local").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
