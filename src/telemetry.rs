//! Tracing subscriber setup: stderr layer, rolling file layer, log retention.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::metadata::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "japa.log";
const FILTER_ENV: &str = "LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub verbosity: u8,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, logging: LoggingConfig) -> Self {
        Self { verbosity, logging }
    }
}

pub fn is_test_env() -> bool {
    std::env::var_os("JAPA_TESTING").is_some() || std::env::var_os("RUST_TEST_THREADS").is_some()
}

/// Long-running commands (`serve`, `session`) log to file unless told otherwise.
pub fn apply_service_logging_defaults(logging: &mut LoggingConfig) {
    let opted_out = is_test_env() || std::env::var_os("JAPA_NO_LOG_FILE").is_some();
    enable_file_logging_unless(logging, opted_out);
}

fn enable_file_logging_unless(logging: &mut LoggingConfig, opted_out: bool) {
    if !opted_out {
        logging.file.enabled = true;
    }
}

/// Keeps the non-blocking file writer flushing until dropped.
pub struct TelemetryGuard {
    _file: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let logging = &config.logging;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if logging.stdout {
        layers.push(format_layer(logging.stdout_format, std::io::stderr, true));
    }

    let mut file_guard = None;
    let mut deferred = Vec::new();
    if logging.file.enabled {
        match open_file_layer(&logging.file) {
            Ok((layer, guard, report)) => {
                layers.push(layer);
                file_guard = Some(guard);
                if let Some(report) = report {
                    deferred.push(Deferred::Pruned(report));
                }
            }
            Err(message) => deferred.push(Deferred::Failed(message)),
        }
    }

    layers.push(Box::new(build_filter(
        config.verbosity,
        logging.filter.as_deref(),
    )));
    Registry::default().with(layers).init();

    // Reported once a subscriber exists.
    for event in deferred {
        match event {
            Deferred::Pruned(report) => tracing::info!(
                removed = report.removed,
                failed = report.failed,
                scanned = report.scanned,
                "log retention applied"
            ),
            Deferred::Failed(message) => tracing::warn!("{message}"),
        }
    }

    TelemetryGuard { _file: file_guard }
}

enum Deferred {
    Pruned(PruneReport),
    Failed(String),
}

fn open_file_layer(
    config: &FileLoggingConfig,
) -> Result<
    (
        BoxedLayer,
        tracing_appender::non_blocking::WorkerGuard,
        Option<PruneReport>,
    ),
    String,
> {
    let dir = config.dir.clone().unwrap_or_else(paths::log_dir);
    fs::create_dir_all(&dir)
        .map_err(|err| format!("log dir init failed for {}: {err}", dir.display()))?;

    let retention = Retention::from_config(config);
    let report = if retention.is_enabled() {
        match prune_logs(&dir, retention, SystemTime::now()) {
            Ok(report) => Some(report),
            Err(err) => {
                return Err(format!("log retention failed for {}: {err}", dir.display()));
            }
        }
    } else {
        None
    };

    let rotation = match config.rotation {
        LogRotation::Daily => tracing_appender::rolling::Rotation::DAILY,
        LogRotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
        LogRotation::Minutely => tracing_appender::rolling::Rotation::MINUTELY,
        LogRotation::Never => tracing_appender::rolling::Rotation::NEVER,
    };
    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((format_layer(config.format, writer, false), guard, report))
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let fmt = || {
        tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_names(true)
    };
    match format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_ansi(ansi)
                .with_writer(writer),
        ),
        LogFormat::Pretty => Box::new(fmt().pretty().with_writer(writer)),
        LogFormat::Compact => Box::new(fmt().compact().with_writer(writer)),
        LogFormat::Json => Box::new(
            fmt()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer),
        ),
    }
}

/// `LOG` wins over the configured filter; both fall back to the `-v` level.
fn build_filter(verbosity: u8, configured: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(verbosity_level(verbosity).into());
    match (std::env::var(FILTER_ENV), configured) {
        (Ok(directives), _) if !directives.trim().is_empty() => builder.parse_lossy(directives),
        (_, Some(directives)) => builder.parse_lossy(directives),
        _ => builder.parse_lossy(""),
    }
}

fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Retention {
    max_age: Option<Duration>,
    max_files: Option<usize>,
}

impl Retention {
    fn from_config(config: &FileLoggingConfig) -> Self {
        Self {
            max_age: config
                .retention_max_age_days
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60))),
            max_files: config.retention_max_files,
        }
    }

    fn is_enabled(self) -> bool {
        self.max_age.is_some() || self.max_files.is_some()
    }

    /// Newest first: a file goes once it is too old or past the count limit.
    fn expired(self, files: &mut [(SystemTime, PathBuf)], now: SystemTime) -> Vec<PathBuf> {
        files.sort_by(|a, b| b.0.cmp(&a.0));
        let mut kept = 0usize;
        let mut expired = Vec::new();
        for (modified, path) in files.iter() {
            let age = now.duration_since(*modified).unwrap_or(Duration::ZERO);
            let too_old = self.max_age.is_some_and(|max| age > max);
            let over_count = self.max_files.is_some_and(|max| kept >= max);
            if too_old || over_count {
                expired.push(path.clone());
            } else {
                kept += 1;
            }
        }
        expired
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PruneReport {
    scanned: usize,
    removed: usize,
    failed: usize,
}

fn prune_logs(dir: &Path, retention: Retention, now: SystemTime) -> std::io::Result<PruneReport> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_log = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        let meta = entry.metadata()?;
        if is_log && meta.is_file() {
            files.push((meta.modified().unwrap_or(now), entry.path()));
        }
    }

    let mut report = PruneReport {
        scanned: files.len(),
        ..PruneReport::default()
    };
    for path in retention.expired(&mut files, now) {
        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(_) => report.failed += 1,
        }
    }
    Ok(report)
}
