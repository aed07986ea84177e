use ::time::OffsetDateTime;

#[macro_use]
pub mod macros;
pub mod logger;
pub mod event;

/// Current wall-clock time in milliseconds since the unix epoch
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
