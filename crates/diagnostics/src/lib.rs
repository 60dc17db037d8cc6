// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Structured logging for the asset catalog crates
//!
//! Every crate in the workspace logs through the macros exported here, which
//! forward to `emit` with its named-capture templates. Every hole in the
//! template needs an explicit `name: value` capture, because locals named
//! only inside the string are not visible through the macro:
//!
//! ```ignore
//! let asset_type = "ComputeInstance";
//! diagnostics::info!("synchronized {asset_type}", asset_type: asset_type);
//! diagnostics::debug!("staged {size} bytes", size: 42);
//! ```
//!
//! Output is controlled by the `ASSETCAT_LOG` environment variable:
//! - `off` (default) - no logs
//! - `error`, `warn`, `info`, `debug` - minimum level written to stderr

use std::sync::Once;

// Re-export emit so the macros resolve from any crate
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV_VAR: &str = "ASSETCAT_LOG";

static INIT: Once = Once::new();

/// Requested log threshold, parsed from `ASSETCAT_LOG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Min(emit::Level),
    /// The value was not recognized; logging falls back to `info`
    Unknown,
}

/// Parse a log setting. Matching is case-insensitive and ignores surrounding whitespace.
#[must_use]
pub fn parse_log_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" => LogSetting::Off,
        "debug" => LogSetting::Min(emit::Level::Debug),
        "info" => LogSetting::Min(emit::Level::Info),
        "warn" | "warning" => LogSetting::Min(emit::Level::Warn),
        "error" => LogSetting::Min(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Initialize diagnostics from the `ASSETCAT_LOG` environment variable
///
/// Call once at process startup. Later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV_VAR).unwrap_or_default();

        let level = match parse_log_setting(&raw) {
            LogSetting::Off => return,
            LogSetting::Min(level) => level,
            LogSetting::Unknown => {
                // Emitter isn't running yet, so this has to go straight to stderr
                #[allow(clippy::print_stderr)]
                {
                    eprintln!("Warning: Unknown {LOG_ENV_VAR} value '{raw}', using 'info'");
                }
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The emitter lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

/// Log normal operations: cycle start and finish, record counts, directory updates
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics: staging paths, queue positions, byte counts
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems: retries, skipped items, sentinel substitution
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures: a queued write that failed, an asset type whose cycle aborted
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}
