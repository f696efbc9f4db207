//! Structured JSONL logging with per-device context for fieldcalc programs
//!
//! Simulations run many devices in one process, each on its own tier. This
//! crate sets up a `tracing` subscriber whose output can be split back per
//! device.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines format for log aggregation (default)
//! - **Device Context Injection**: Spans remember the device and tier they were opened for
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//! - **Filtering**: Per-crate and per-target directives on top of `RUST_LOG`
//!
//! # Quick Start
//!
//! ```ignore
//! use fieldcalc_logging::{FieldCalcSubscriberBuilder, LogConfig};
//!
//! // Simple setup with defaults (JSONL to console)
//! let _guard = FieldCalcSubscriberBuilder::new().init();
//!
//! // Development mode with human-readable output
//! let _guard = FieldCalcSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Device Context
//!
//! Use [`DeviceContextGuard`] to set the device for a scope:
//!
//! ```ignore
//! use fieldcalc_core::{DeviceId, TierBit};
//! use fieldcalc_logging::DeviceContextGuard;
//!
//! let _guard = DeviceContextGuard::with_tier(DeviceId(7), TierBit::new(8)?);
//! tracing::info!("round started");
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, FilterConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{DeviceContextData, DeviceContextGuard};
pub use layers::{DeviceContextExtension, DeviceContextLayer, jsonl_layer};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create rolling appender: {0}")]
    Appender(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Subscriber stack below the output layers
type Base = Layered<DeviceContextLayer, Layered<EnvFilter, Registry>>;

type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

/// Builder for configuring and initializing the fieldcalc logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable output during development.
pub struct FieldCalcSubscriberBuilder {
    config: LogConfig,
}

impl FieldCalcSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Initialize the subscriber globally
    ///
    /// Returns a guard that must be kept alive for the duration of the
    /// program when file output is enabled. Failures are reported on stderr
    /// and leave logging disabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = self.env_filter()?;
        let (layers, guard) = self.output_layers()?;

        Registry::default()
            .with(env_filter)
            .with(DeviceContextLayer::new())
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }

    /// `RUST_LOG` when set, the configured directives otherwise
    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.config.filter_directives())
                .map_err(|e| LoggingError::InvalidFilter(e.to_string())),
        }
    }

    fn output_layers(&self) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), LoggingError> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        let console = &self.config.console;
        if console.enabled {
            let layer: BoxedLayer = if console.pretty {
                tracing_subscriber::fmt::layer()
                    .with_ansi(console.ansi)
                    .with_target(true)
                    .boxed()
            } else {
                jsonl_layer(std::io::stdout, &self.config.jsonl).boxed()
            };
            let layer = match &console.level {
                Some(level) => {
                    let filter = EnvFilter::try_new(level)
                        .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;
                    layer.with_filter(filter).boxed()
                }
                None => layer,
            };
            layers.push(layer);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(jsonl_layer(writer, &self.config.jsonl).boxed());
        }

        Ok((layers, guard))
    }
}

impl Default for FieldCalcSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking writer for file output; `Never` truncates a single file,
/// the other strategies append to rotating files
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.single_file_path();
            fs::create_dir_all(&config.directory).map_err(|source| LoggingError::LogFile {
                path: config.directory.clone(),
                source,
            })?;
            let file = File::create(&path).map_err(|source| LoggingError::LogFile { path, source })?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.as_str())
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder
        .build(&config.directory)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() -> Option<WorkerGuard> {
    FieldCalcSubscriberBuilder::new().init()
}

/// Initialize logging for development (verbose, human-readable console output)
pub fn init_development() -> Option<WorkerGuard> {
    FieldCalcSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Initialize logging for testing (minimal output, repeated calls are ignored)
pub fn init_testing() {
    let _ = FieldCalcSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
