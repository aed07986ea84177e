use ::std::io;

use ::fern;
use ::log;
use ::time::OffsetDateTime;
use ::time::macros::format_description;

use crate::error::MResult;

/// Map a config string onto a log level, defaulting to warn for junk values
fn parse_level(levelstr: &str) -> log::LevelFilter {
    match levelstr.to_lowercase().as_ref() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => {
            println!("muzima: config: bad `loglevel` value (\"{}\"), defaulting to \"warn\"", levelstr);
            log::LevelFilter::Warn
        }
    }
}

/// a simple wrapper (pretty much direct from documentation) that sets up
/// logging to STDOUT via fern/log
pub fn setup_logger() -> MResult<()> {
    let levelstr: String = config::get(&["loglevel"])?;
    let level = parse_level(&levelstr);
    let timefmt = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = OffsetDateTime::now_utc()
                .format(timefmt)
                .unwrap_or_else(|_| String::from("????-??-??T??:??:??"));
            out.finish(format_args!(
                "{} - [{}][{}] {}",
                now,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout());
    match dispatch.apply() {
        Ok(_) => {}
        Err(e) => {
            // already set up (tests, or a host that inits twice)
            trace!("logger::setup_logger() -- looks like the logger was already init: {}", e);
        }
    }
    log_panics::init();
    Ok(())
}
