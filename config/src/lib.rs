//! Global, app-wide configuration. Starts from a set of built-in defaults, then
//! layers an optional YAML file and any runtime JSON on top.

extern crate jedi;
#[macro_use]
extern crate lazy_static;

use ::std::fs::File;
use ::std::path::Path;
use ::std::io::prelude::*;
use ::std::env;
use ::std::sync::RwLock;

use ::jedi::{JSONError, Value, Serialize, DeserializeOwned};

pub type CResult<T> = Result<T, JSONError>;

/// Used when nothing else is loaded. Every key the core reads has a value
/// here.
const DEFAULTS: &str = r#"
loglevel: info
messaging:
  requests: muzima-sync-in
  events: muzima-events
sync:
  worker_name: "sync:worker"
storage:
  path: ":memory:"
"#;

lazy_static! {
    /// create a static/global CONFIG var, and load it with our defaults
    static ref CONFIG: RwLock<Value> = {
        match jedi::parse_yaml(DEFAULTS) {
            Ok(x) => RwLock::new(x),
            Err(e) => {
                panic!("error loading default config: {}", e);
            }
        }
    };
}

/// Load a YAML config file on top of the defaults. If `location` is None we
/// check `MUZIMA_CONFIG_FILE`, then `config.yaml`. A missing default file is
/// not an error, a missing explicit one is.
pub fn load_config(location: Option<String>) -> CResult<()> {
    let (path_str, explicit) = match location {
        Some(x) => (x, true),
        None => match env::var("MUZIMA_CONFIG_FILE") {
            Ok(x) => (x, true),
            Err(_) => (String::from("config.yaml"), false),
        },
    };
    let path = Path::new(&path_str);
    if !explicit && !path.exists() {
        return Ok(());
    }
    let mut file = File::open(&path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let data: Value = jedi::parse_yaml(&contents)?;
    merge(&data)
}

/// Merge a JSON value into the current config, overwriting any keys that
/// already exist.
pub fn merge(data: &Value) -> CResult<()> {
    let mut guard = CONFIG.write().map_err(|_| JSONError::NotFound(String::from("config: lock poisoned")))?;
    jedi::merge(&mut guard, data);
    Ok(())
}

/// Get a value from our config
pub fn get<T: DeserializeOwned>(keys: &[&str]) -> CResult<T> {
    let guard = CONFIG.read().map_err(|_| JSONError::NotFound(String::from("config: lock poisoned")))?;
    jedi::get(keys, &guard)
}

/// Get a value from our config, or None if it's missing or the wrong type
pub fn get_opt<T: DeserializeOwned>(keys: &[&str]) -> Option<T> {
    get(keys).ok()
}

/// Set a value into our config
pub fn set<T: Serialize>(keys: &[&str], val: &T) -> CResult<()> {
    let mut guard = CONFIG.write().map_err(|_| JSONError::NotFound(String::from("config: lock poisoned")))?;
    jedi::set(keys, &mut guard, val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde_json::json;

    #[test]
    fn has_defaults() {
        let events: String = get(&["messaging", "events"]).unwrap();
        assert_eq!(events, "muzima-events");
        let path: String = get(&["storage", "path"]).unwrap();
        assert_eq!(path, ":memory:");
        let nope: Option<String> = get_opt(&["messaging", "carrier-pigeon"]);
        assert_eq!(nope, None);
    }

    #[test]
    fn merges_and_sets() {
        merge(&json!({"sync": {"test_flag": "merged"}})).unwrap();
        let val: String = get(&["sync", "test_flag"]).unwrap();
        assert_eq!(val, "merged");
        let worker: String = get(&["sync", "worker_name"]).unwrap();
        assert_eq!(worker, "sync:worker");

        set(&["sync", "test_flag"], &"set").unwrap();
        let val: String = get(&["sync", "test_flag"]).unwrap();
        assert_eq!(val, "set");
    }

    #[test]
    fn missing_explicit_file_errors() {
        assert!(load_config(Some(String::from("/nonexistent/muzima.yaml"))).is_err());
    }
}
