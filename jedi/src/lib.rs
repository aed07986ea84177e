//! A collection of utilities for dealing with JSON and YAML objects.

#[macro_use]
extern crate quick_error;
extern crate serde;
#[cfg_attr(test, macro_use)]
extern crate serde_json;
extern crate serde_yaml;

use ::std::error::Error;
use ::std::convert::From;

pub use ::serde_json::Value;
pub use ::serde_json::Map;
pub use ::serde::de::{Deserialize, DeserializeOwned};
pub use ::serde::ser::Serialize;

quick_error! {
    #[derive(Debug)]
    pub enum JSONError {
        Boxed(err: Box<dyn Error + Send + Sync>) {
            description("boxed error")
            display("json: error: {}", err)
        }
        Parse(err: serde_json::Error) {
            cause(err)
            description("parse error")
            display("json: parse error: {}", err)
        }
        Stringify(err: serde_json::Error) {
            cause(err)
            description("stringify error")
            display("json: stringify error: {}", err)
        }
        Yaml(err: serde_yaml::Error) {
            cause(err)
            description("yaml error")
            display("json: yaml error: {}", err)
        }
        DeadEnd {
            description("dead end")
            display("json: lookup dead end")
        }
        NotFound(key: String) {
            description("key not found")
            display("json: key not found: {}", key)
        }
        InvalidKey(key: String) {
            description("invalid key")
            display("json: invalid key for object: {}", key)
        }
    }
}

pub type JResult<T> = Result<T, JSONError>;

impl From<::std::io::Error> for JSONError {
    fn from(err: ::std::io::Error) -> JSONError {
        JSONError::Boxed(Box::new(err))
    }
}

impl From<serde_yaml::Error> for JSONError {
    fn from(err: serde_yaml::Error) -> JSONError {
        JSONError::Yaml(err)
    }
}

/// Parse a JSON string into anything deserializable
pub fn parse<T: DeserializeOwned>(string: &str) -> JResult<T> {
    serde_json::from_str(string).map_err(JSONError::Parse)
}

/// Parse a YAML string and return a Value type
pub fn parse_yaml(string: &str) -> JResult<Value> {
    let data: Value = serde_yaml::from_str(string)?;
    Ok(data)
}

/// Turn a JSON-serializable object into a Result<String> of JSON.
pub fn stringify<T: Serialize>(obj: &T) -> JResult<String> {
    serde_json::to_string(obj).map_err(JSONError::Stringify)
}

/// Turn a JSON-serializable object into a Result<Value>
pub fn to_val<T: Serialize>(obj: &T) -> JResult<Value> {
    serde_json::to_value(obj).map_err(JSONError::Stringify)
}

/// An empty JSON object
pub fn obj() -> Value {
    Value::Object(Map::new())
}

/// Walk a JSON structure, given a key path. Traverses both objects and arrays,
/// returning a reference to the found value, if any.
pub fn walk<'a>(keys: &[&str], data: &'a Value) -> JResult<&'a Value> {
    if keys.is_empty() { return Ok(data); }

    let key = keys[0];
    match *data {
        Value::Object(ref obj) => {
            match obj.get(key) {
                Some(d) => walk(&keys[1..], d),
                None => Err(JSONError::NotFound(key.to_owned())),
            }
        }
        Value::Array(ref arr) => {
            let ukey = match key.parse::<usize>() {
                Ok(x) => x,
                Err(..) => return Err(JSONError::InvalidKey(key.to_owned())),
            };
            match arr.get(ukey) {
                Some(d) => walk(&keys[1..], d),
                None => Err(JSONError::NotFound(key.to_owned())),
            }
        }
        _ => Err(JSONError::DeadEnd),
    }
}

/// Same as `walk`, but hands back a mutable reference.
pub fn walk_mut<'a>(keys: &[&str], data: &'a mut Value) -> JResult<&'a mut Value> {
    if keys.is_empty() { return Ok(data); }

    let key = keys[0];
    match *data {
        Value::Object(ref mut obj) => {
            match obj.get_mut(key) {
                Some(d) => walk_mut(&keys[1..], d),
                None => Err(JSONError::NotFound(key.to_owned())),
            }
        }
        Value::Array(ref mut arr) => {
            let ukey = match key.parse::<usize>() {
                Ok(x) => x,
                Err(..) => return Err(JSONError::InvalidKey(key.to_owned())),
            };
            match arr.get_mut(ukey) {
                Some(d) => walk_mut(&keys[1..], d),
                None => Err(JSONError::NotFound(key.to_owned())),
            }
        }
        _ => Err(JSONError::DeadEnd),
    }
}

/// Like `walk`, except that this returns the deserialized type instead of a
/// Value.
pub fn get<T: DeserializeOwned>(keys: &[&str], value: &Value) -> JResult<T> {
    let found = walk(keys, value)?;
    serde_json::from_value(found.clone())
        .map_err(|e| JSONError::NotFound(format!("get: {:?}: {}", keys, e)))
}

/// `get()`, with every error flattened into None.
pub fn get_opt<T: DeserializeOwned>(keys: &[&str], value: &Value) -> Option<T> {
    get(keys, value).ok()
}

/// Set a field into a mutable JSON Value. Intermediate objects must exist.
pub fn set<T: Serialize>(keys: &[&str], container: &mut Value, to: &T) -> JResult<()> {
    if keys.is_empty() {
        return Err(JSONError::InvalidKey(String::from("set: no keys given")));
    }

    let butlast = &keys[0..(keys.len() - 1)];
    let last = keys[keys.len() - 1];

    let val = walk_mut(butlast, container)?;
    match *val {
        Value::Object(ref mut x) => {
            x.insert(String::from(last), to_val(to)?);
            Ok(())
        }
        Value::Array(ref mut x) => {
            let ukey = match last.parse::<usize>() {
                Ok(x) => x,
                Err(..) => return Err(JSONError::InvalidKey(last.to_owned())),
            };
            match x.get_mut(ukey) {
                Some(slot) => {
                    *slot = to_val(to)?;
                    Ok(())
                }
                None => Err(JSONError::NotFound(last.to_owned())),
            }
        }
        _ => Err(JSONError::DeadEnd),
    }
}

/// Deep-merge `from` into `into`. Objects merge key by key, anything else
/// replaces what was there.
pub fn merge(into: &mut Value, from: &Value) {
    match (into, from) {
        (&mut Value::Object(ref mut a), &Value::Object(ref b)) => {
            for (k, v) in b {
                merge(a.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
        (a, b) => {
            *a = b.clone();
        }
    }
}
