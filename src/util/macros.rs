/// Grab a read lock, panicking if it's poisoned
#[macro_export]
macro_rules! lockr {
    ($lockable:expr) => {
        match $lockable.read() {
            Ok(x) => x,
            Err(e) => panic!("lockr!() -- poisoned lock: {}", e),
        }
    }
}

/// Grab a write lock, panicking if it's poisoned
#[macro_export]
macro_rules! lockw {
    ($lockable:expr) => {
        match $lockable.write() {
            Ok(x) => x,
            Err(e) => panic!("lockw!() -- poisoned lock: {}", e),
        }
    }
}

/// Grab a mutex
#[macro_export]
macro_rules! lock {
    ($lockable:expr) => {
        match $lockable.lock() {
            Ok(x) => x,
            Err(e) => panic!("lock!() -- poisoned mutex: {}", e),
        }
    }
}
