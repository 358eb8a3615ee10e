/// Log file name for hosts that enable file output.
pub const LOG_FILE_NAME: &str = "mixpool.log";

/// Console pattern: `timestamp [LEVEL] message [module]`.
pub const LOG_LINE_PATTERN_COLORED: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{h({l:5})}] {m} [{M}]{n}";

/// File pattern (no colors).
pub const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l:5}] {m} [{M}]{n}";

/// Maximum log file size before rotation (50 MB).
pub const LOG_FILE_MAX_SIZE: u64 = 50_000_000;

/// Maximum number of archived log files.
pub const LOG_FILE_MAX_ROLLS: u32 = 5;

/// Crates logged at the requested level by default; everything else is off
/// unless opted in per module.
pub const WHITELISTED_CRATES: &[&str] = &["mixpool_core"];
