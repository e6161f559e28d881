//! Tracing setup for the binaries
//!
//! Console output goes to stderr so stdout stays free for command results.
//! `RUST_LOG` controls the filter (default `info`). `OKR_LOG_JSON=1` switches
//! the console to JSON lines; `OKR_LOG_DIR` adds a daily rolling log file.

use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process when file logging is on, or buffered lines are lost.
pub fn init_tracing(default_filter: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = if env_bool("OKR_LOG_JSON", false) {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match env::var("OKR_LOG_DIR").ok().filter(|d| !d.is_empty()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "okr-client.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_common_spellings() {
        env::set_var("OKR_TEST_BOOL_YES", "yes");
        env::set_var("OKR_TEST_BOOL_NO", "0");
        env::set_var("OKR_TEST_BOOL_JUNK", "maybe");
        assert!(env_bool("OKR_TEST_BOOL_YES", false));
        assert!(!env_bool("OKR_TEST_BOOL_NO", true));
        assert!(env_bool("OKR_TEST_BOOL_JUNK", true));
        assert!(!env_bool("OKR_TEST_BOOL_UNSET", false));
    }
}
