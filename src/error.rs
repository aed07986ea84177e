use ::std::error::Error;
use ::std::convert::From;
use ::std::any::Any;

use ::jedi::JSONError;

quick_error! {
    #[derive(Debug)]
    /// Muzima core's main error object.
    pub enum MError {
        Boxed(err: Box<dyn Error + Send + Sync>) {
            description("boxed error")
            display("error: {}", err)
        }
        Msg(str: String) {
            description(str)
            display("error: {}", str)
        }
        BadValue(str: String) {
            description(str)
            display("bad value: {}", str)
        }
        MissingField(str: String) {
            description(str)
            display("missing field: {}", str)
        }
        MissingCommand(str: String) {
            description(str)
            display("unknown command: {}", str)
        }
        Network(str: String) {
            description(str)
            display("network error: {}", str)
        }
        Panic(str: String) {
            description(str)
            display("panic: {}", str)
        }
        Shutdown {
            description("shutting down")
            display("shutting down")
        }
    }
}

/// converts non-MError errors to MError, via the From trait. Foreign errors
/// need a From impl, which the from_err! macro below makes painless.
#[macro_export]
macro_rules! toterr {
    ($e:expr) => (
        {
            let err: $crate::error::MError = From::from($e);
            err
        }
    )
}

/// A macro to make it easy to create From impls for MError
macro_rules! from_err {
    ($t:ty) => (
        impl From<$t> for MError {
            fn from(err: $t) -> MError {
                MError::Boxed(Box::new(err))
            }
        }
    )
}

impl From<JSONError> for MError {
    fn from(err: JSONError) -> MError {
        match err {
            JSONError::Boxed(x) => MError::Boxed(x),
            _ => MError::Boxed(Box::new(err)),
        }
    }
}

impl From<Box<dyn Any + Send>> for MError {
    fn from(err: Box<dyn Any + Send>) -> MError {
        if let Some(msg) = err.downcast_ref::<&str>() {
            return MError::Panic(String::from(*msg));
        }
        if let Some(msg) = err.downcast_ref::<String>() {
            return MError::Panic(msg.clone());
        }
        MError::Panic(format!("{:?}", err))
    }
}

impl<T> From<::crossbeam::channel::SendError<T>> for MError {
    fn from(err: ::crossbeam::channel::SendError<T>) -> MError {
        MError::Msg(format!("channel send: {}", err))
    }
}

from_err!(::std::io::Error);
from_err!(::log::SetLoggerError);
from_err!(::carrier::CError);
from_err!(::std::string::FromUtf8Error);
from_err!(::rusqlite::Error);

pub type MResult<T> = Result<T, MError>;

/// A helper to make reporting errors easier
#[macro_export]
macro_rules! try_or {
    ($ex:expr, $sym:ident, $err:expr) => {
        match $ex {
            Ok(_) => (),
            Err($sym) => {
                $err;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::std::panic;

    #[test]
    fn converts_panics() {
        let res = panic::catch_unwind(|| {
            panic!("backend exploded");
        });
        let err: MError = From::from(res.unwrap_err());
        match &err {
            MError::Panic(msg) => assert_eq!(msg, "backend exploded"),
            _ => panic!("wrong error type: {}", err),
        }

        let res = panic::catch_unwind(|| {
            panic!("{} records", 12);
        });
        let err = toterr!(res.unwrap_err());
        assert_eq!(format!("{}", err), "panic: 12 records");
    }

    #[test]
    fn boxes_foreign_errors() {
        let err = toterr!(::std::io::Error::new(::std::io::ErrorKind::Other, "disk gone"));
        assert_eq!(format!("{}", err), "error: disk gone");
    }
}
