use std::{panic, path::PathBuf, sync::OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging knobs read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `JM_LOG_DIR`: write daily-rotated files here instead of stderr.
    pub log_dir: Option<PathBuf>,
    /// `JM_LOG_INCLUDE_BACKTRACE`: chain the default panic hook after logging.
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            log_dir: std::env::var_os("JM_LOG_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            include_backtrace: env_flag("JM_LOG_INCLUDE_BACKTRACE"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Route panics through `tracing::error!` with thread and location context.
/// Installed once per process.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();
        let include_backtrace = LogSettings::from_env().include_backtrace;

        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let thread_name = thread.name().unwrap_or("unknown");

            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload not string".into());

            tracing::error!(
                application = app_name,
                %thread_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

fn rotating_file_writer(app_name: &'static str, dir: PathBuf) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create JM_LOG_DIR {}: {err}; logging to stderr", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Install the global subscriber. `RUST_LOG` drives filtering (default `info`);
/// output goes to `<JM_LOG_DIR>/<app>.log` when set, stderr otherwise so stdout
/// stays free for command output.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let writer = LogSettings::from_env()
        .log_dir
        .and_then(|dir| rotating_file_writer(app_name, dir));

    match writer {
        Some(writer) => {
            let _ = builder.with_writer(writer).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _lock = ENV_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let previous: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();
        for (key, value) in vars {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
        f();
        for (key, value) in previous {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }

    #[test]
    fn settings_default_to_stderr_without_backtrace() {
        with_env(
            &[("JM_LOG_DIR", None), ("JM_LOG_INCLUDE_BACKTRACE", None)],
            || {
                let settings = LogSettings::from_env();
                assert_eq!(settings.log_dir, None);
                assert!(!settings.include_backtrace);
            },
        );
    }

    #[test]
    fn settings_read_directory_and_flag() {
        with_env(
            &[
                ("JM_LOG_DIR", Some("/tmp/jm-logs")),
                ("JM_LOG_INCLUDE_BACKTRACE", Some("TRUE")),
            ],
            || {
                let settings = LogSettings::from_env();
                assert_eq!(settings.log_dir, Some(PathBuf::from("/tmp/jm-logs")));
                assert!(settings.include_backtrace);
            },
        );
    }

    #[test]
    fn empty_log_dir_is_ignored() {
        with_env(&[("JM_LOG_DIR", Some(""))], || {
            assert_eq!(LogSettings::from_env().log_dir, None);
        });
    }
}
