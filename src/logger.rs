//! log4rs setup. Library code only talks to the `log` facade; binaries and tests pick one of
//! these initializers.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::utils::devlog::QUERY_TARGET;

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initialize from a log4rs YAML file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(
    base: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Build the rolling-file config: `app.log` for everything, `query.log` for per-query timing
/// lines.
///
/// - dir: base directory for logs; the current directory when `None`.
/// - level: off|error|warn|info|debug|trace
/// - retention: rolled files kept per log (default 7)
///
/// # Errors
/// Returns an error if the directory or an appender cannot be created.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(u32::MAX);
    let lvl = parse_level(level);
    let query_lvl = if lvl == LevelFilter::Off { LevelFilter::Off } else { LevelFilter::Debug };
    Ok(Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("query", Box::new(rolling(&base, "query", keep)?)))
        .logger(Logger::builder().appender("query").additive(false).build(QUERY_TARGET, query_lvl))
        .build(Root::builder().appender("app").build(lvl))?)
}

/// Install [`build_config`] as the process logger.
///
/// # Errors
/// Returns an error if the config cannot be built or a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_config(build_config(dir, level, retention)?)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - SALESQ_LOG_DIR
/// - SALESQ_LOG_LEVEL
/// - SALESQ_LOG_RETENTION
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("SALESQ_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("SALESQ_LOG_LEVEL").ok();
    let retention =
        std::env::var("SALESQ_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}
