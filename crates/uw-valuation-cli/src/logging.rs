//! stderr logging for the CLI. Stdout carries only command output.

use flexi_logger::{Logger, LoggerHandle};

const DEFAULT_LEVEL: &str = "warn";

/// Start the logger. An explicit `--log-level` wins over `RUST_LOG`; with
/// neither, only warnings and errors are shown.
///
/// The returned handle must stay alive for the life of the process.
pub fn init_logging(level: Option<&str>) -> Result<LoggerHandle, String> {
    let logger = match level {
        Some(level) => {
            let level = normalize_level(level)?;
            Logger::try_with_str(level).map_err(|err| format!("invalid log level `{level}`: {err}"))?
        }
        None => Logger::try_with_env_or_str(DEFAULT_LEVEL)
            .map_err(|err| format!("invalid RUST_LOG specification: {err}"))?,
    };
    logger
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level(" WARNING "), Ok("warn"));
        assert_eq!(normalize_level("debug"), Ok("debug"));
        assert!(normalize_level("loud").is_err());
    }
}
