//! Logging setup using `log` + `log4rs`.
//!
//! Hosts that already configure a global logger can skip this entirely; the
//! crate only emits through the `log` facade.

mod consts;

pub use consts::*;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::io::IsTerminal;
use std::path::PathBuf;

const CONSOLE_APPENDER: &str = "stderr";
const FILE_APPENDER: &str = "log_file";

/// Initialize the global logger. `filters` is a comma-separated expression:
/// a bare level sets the app level ("debug"), `module=level` pairs opt
/// specific crates in ("mixpool_core=trace"). Repeated calls are ignored.
pub fn init_logger(log_dir: Option<&str>, filters: &str) {
    let app_level = parse_app_level(filters);
    let module_levels = parse_module_levels(filters);

    let pattern = if std::io::stderr().is_terminal() { LOG_LINE_PATTERN_COLORED } else { LOG_LINE_PATTERN };
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders: Vec<&str> = vec![CONSOLE_APPENDER];

    if let Some(dir) = log_dir.filter(|dir| !dir.trim().is_empty()) {
        let dir = dir.trim();
        let log_path = PathBuf::from(dir).join(LOG_FILE_NAME);
        let archive = PathBuf::from(dir).join(format!("{LOG_FILE_NAME}.{{}}.gz"));
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(archive.to_str().unwrap_or("mixpool.log.{}.gz"), LOG_FILE_MAX_ROLLS);
        if let Ok(roller) = roller {
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
            let file = RollingFileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
                .build(log_path, Box::new(policy));
            if let Ok(file) = file {
                builder = builder.appender(Appender::builder().build(FILE_APPENDER, Box::new(file)));
                appenders.push(FILE_APPENDER);
            }
        }
    }

    let appender_names: Vec<String> = appenders.iter().map(|name| (*name).to_string()).collect();

    for crate_name in WHITELISTED_CRATES {
        if !module_levels.iter().any(|(module, _)| module == crate_name) {
            builder = builder.logger(
                Logger::builder().appenders(appender_names.clone()).additive(false).build(*crate_name, app_level),
            );
        }
    }
    for (module, level) in &module_levels {
        builder =
            builder.logger(Logger::builder().appenders(appender_names.clone()).additive(false).build(module, *level));
    }

    if let Ok(config) = builder.build(Root::builder().appenders(appenders).build(LevelFilter::Off)) {
        let _ = log4rs::init_config(config);
    }
}

fn parse_app_level(filters: &str) -> LevelFilter {
    filters
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && !part.contains('='))
        .find_map(|part| part.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn parse_module_levels(filters: &str) -> Vec<(String, LevelFilter)> {
    filters
        .split(',')
        .filter_map(|part| {
            let (module, level) = part.split_once('=')?;
            let module = module.trim();
            if module.is_empty() {
                return None;
            }
            Some((module.to_string(), level.trim().parse().ok()?))
        })
        .collect()
}
