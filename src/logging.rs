//! File logging. The terminal belongs to the UI, so tracing output goes to
//! `<data dir>/nichetube.log` through a non-blocking appender.

use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::constants::constants;

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines are flushed. Returns `None` when no log directory is usable.
pub fn init_tracing() -> Option<WorkerGuard> {
  let app = &constants().app_name;
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("{}=info", app).into());

  let log_dir = ProjectDirs::from("", "", app)?.data_local_dir().to_path_buf();
  if let Err(err) = std::fs::create_dir_all(&log_dir) {
    eprintln!("Failed to create log directory {}: {}", log_dir.display(), err);
    return None;
  }

  let file_appender = tracing_appender::rolling::never(&log_dir, format!("{}.log", app));
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).try_init();
  Some(guard)
}
