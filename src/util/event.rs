//! A small event emitter. Observers bind callbacks to an event name (and a
//! binding name, so they can be replaced or removed later) and get handed the
//! JSON payload of each triggered event.
//!
//! Bindings live behind an RwLock, so an emitter can be bound/triggered from
//! any thread. Callbacks run outside the lock, which means a callback is free
//! to bind or unbind on the same emitter.

use ::std::sync::{Arc, RwLock};
use ::std::collections::HashMap;

use ::jedi::Value;

/// Whether a binding survives being fired
#[derive(Clone, Copy, Debug, PartialEq)]
enum BindType {
    Every,
    Once,
}

/// Anything that can be called with an event payload.
pub trait EventThunk: Send + Sync + 'static {
    fn call_box(&self, data: &Value);
}
impl<F: Fn(&Value) + Send + Sync + 'static> EventThunk for F {
    fn call_box(&self, data: &Value) {
        (*self)(data);
    }
}

/// Holds information about a callback.
pub struct Callback {
    cb: Arc<dyn EventThunk>,
    binding: BindType,
    name: String,
}

pub type Bindings = RwLock<HashMap<String, Vec<Callback>>>;

/// Binding and triggering. Implementors only provide `bindings()`.
pub trait Emitter {
    fn bindings(&self) -> &Bindings;

    #[doc(hidden)]
    fn do_bind(&self, event_name: &str, cb: Callback) {
        // same event/binding name pair replaces the old binding
        self.unbind(event_name, cb.name.as_str());
        let mut guard = lockw!(self.bindings());
        guard.entry(String::from(event_name)).or_insert_with(Vec::new).push(cb);
    }

    /// Call `cb` every time `event_name` fires.
    fn bind<F>(&self, event_name: &str, cb: F, bind_name: &str)
        where F: Fn(&Value) + Send + Sync + 'static
    {
        self.do_bind(event_name, Callback {
            cb: Arc::new(cb),
            binding: BindType::Every,
            name: String::from(bind_name),
        });
    }

    /// Call `cb` the next time `event_name` fires, then forget it.
    fn bind_once<F>(&self, event_name: &str, cb: F, bind_name: &str)
        where F: Fn(&Value) + Send + Sync + 'static
    {
        self.do_bind(event_name, Callback {
            cb: Arc::new(cb),
            binding: BindType::Once,
            name: String::from(bind_name),
        });
    }

    /// Remove a binding. Returns whether anything was removed.
    fn unbind(&self, event_name: &str, bind_name: &str) -> bool {
        let mut guard = lockw!(self.bindings());
        match guard.get_mut(event_name) {
            Some(callbacks) => {
                let before = callbacks.len();
                callbacks.retain(|c| c.name != bind_name);
                before != callbacks.len()
            }
            None => false,
        }
    }

    /// How many callbacks are bound to an event
    fn listeners(&self, event_name: &str) -> usize {
        let guard = lockr!(self.bindings());
        guard.get(event_name).map(|x| x.len()).unwrap_or(0)
    }

    /// Fire an event. Callbacks run in the order they were bound.
    fn trigger(&self, event_name: &str, data: &Value) {
        let to_call: Vec<Arc<dyn EventThunk>> = {
            let mut guard = lockw!(self.bindings());
            match guard.get_mut(event_name) {
                Some(callbacks) => {
                    let calls = callbacks.iter().map(|c| c.cb.clone()).collect();
                    callbacks.retain(|c| c.binding != BindType::Once);
                    calls
                }
                None => return,
            }
        };
        for cb in to_call {
            cb.call_box(data);
        }
    }
}

/// A standalone emitter
pub struct EventEmitter {
    bindings: Bindings,
}

impl EventEmitter {
    pub fn new() -> EventEmitter {
        EventEmitter { bindings: RwLock::new(HashMap::new()) }
    }
}

impl Emitter for EventEmitter {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl Default for EventEmitter {
    fn default() -> EventEmitter {
        EventEmitter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::std::sync::{Arc, RwLock};
    use ::jedi;
    use ::serde_json::json;

    fn counter() -> Arc<RwLock<Vec<String>>> {
        Arc::new(RwLock::new(Vec::new()))
    }

    #[test]
    fn bind_trigger() {
        let seen = counter();
        let emitter = EventEmitter::new();
        let seen2 = seen.clone();
        emitter.bind("sync:status", move |x: &Value| {
            seen2.write().unwrap().push(jedi::get::<String>(&["step"], x).unwrap());
        }, "test:status");

        emitter.trigger("sync:progress", &json!({"step": "forms"}));
        assert_eq!(seen.read().unwrap().len(), 0);
        emitter.trigger("sync:status", &json!({"step": "forms"}));
        emitter.trigger("sync:status", &json!({"step": "cohorts"}));
        assert_eq!(*seen.read().unwrap(), vec!["forms", "cohorts"]);
    }

    #[test]
    fn bind_once() {
        let seen = counter();
        let emitter = EventEmitter::new();
        let seen2 = seen.clone();
        emitter.bind_once("sync:status", move |_| {
            seen2.write().unwrap().push(String::from("once"));
        }, "test:once");
        assert_eq!(emitter.listeners("sync:status"), 1);
        emitter.trigger("sync:status", &jedi::obj());
        emitter.trigger("sync:status", &jedi::obj());
        assert_eq!(seen.read().unwrap().len(), 1);
        assert_eq!(emitter.listeners("sync:status"), 0);
    }

    #[test]
    fn same_name_replaces() {
        let seen = counter();
        let emitter = EventEmitter::new();
        let seen2 = seen.clone();
        emitter.bind("sync:status", move |_| {
            seen2.write().unwrap().push(String::from("first"));
        }, "dashboard");
        emitter.bind("sync:status", move |_| {}, "dashboard");
        emitter.trigger("sync:status", &jedi::obj());
        assert_eq!(seen.read().unwrap().len(), 0);
        assert_eq!(emitter.listeners("sync:status"), 1);
    }

    #[test]
    fn unbinds() {
        let seen = counter();
        let emitter = EventEmitter::new();
        let seen2 = seen.clone();
        emitter.bind("sync:status", move |_| {
            seen2.write().unwrap().push(String::from("hit"));
        }, "test:unbind");
        emitter.trigger("sync:status", &jedi::obj());
        assert!(emitter.unbind("sync:status", "test:unbind"));
        assert!(!emitter.unbind("sync:status", "test:unbind"));
        emitter.trigger("sync:status", &jedi::obj());
        assert_eq!(seen.read().unwrap().len(), 1);
    }

    #[test]
    fn callbacks_can_rebind() {
        let emitter = Arc::new(EventEmitter::new());
        let emitter2 = emitter.clone();
        emitter.bind_once("sync:status", move |_| {
            emitter2.bind("sync:status", |_| {}, "rebound");
        }, "first");
        emitter.trigger("sync:status", &jedi::obj());
        assert_eq!(emitter.listeners("sync:status"), 1);
    }
}
