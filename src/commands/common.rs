//! Shared wiring used by all octoindex commands.

use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use directories::ProjectDirs;
use octoindex::Result;
use octoindex::config::Config;
use octoindex::github::Client;
use octoindex::ingest::{ArchiveWriter, IndexWriter, Ingestor};
use octoindex::query::Aggregator;
use octoindex::store::fs::{FsObjectStore, FsRecordStore, FsWorkQueue};
use octoindex::store::{ObjectStore, RecordStore, WorkQueue};
use ohno::{IntoAppError, app_err};
use std::fs;
use std::sync::Arc;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// GitHub personal access token for authenticated API requests
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Directory holding the archive, index, and work queue [default: the platform's data directory]
    #[arg(long, value_name = "PATH", env = "OCTOINDEX_DATA_DIR")]
    pub data_dir: Option<Utf8PathBuf>,

    /// Path to configuration file [default: octoindex.toml in the data directory]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

/// Loaded configuration plus the storage providers rooted in the data
/// directory.
pub struct Common {
    pub config: Config,
    github_token: Option<String>,
    api_url: String,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    queue: Arc<dyn WorkQueue>,
}

impl Common {
    /// Initialize logging, load the configuration, and open the filesystem
    /// providers under the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// configuration cannot be loaded
    pub fn new(args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let data_dir = resolve_data_dir(args.data_dir.as_ref())?;
        fs::create_dir_all(&data_dir).into_app_err_with(|| format!("creating data directory '{data_dir}'"))?;

        let config = Config::load(&data_dir, args.config.as_ref())?;

        Ok(Self {
            config,
            github_token: args.github_token.clone(),
            api_url: args.api_url.clone(),
            objects: Arc::new(FsObjectStore::new(data_dir.join("objects").into_std_path_buf())),
            records: Arc::new(FsRecordStore::new(data_dir.join("index").into_std_path_buf())),
            queue: Arc::new(FsWorkQueue::new(data_dir.join("queue").into_std_path_buf())),
        })
    }

    #[must_use]
    pub fn records(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.records)
    }

    #[must_use]
    pub fn queue(&self) -> Arc<dyn WorkQueue> {
        Arc::clone(&self.queue)
    }

    /// Build the API client from the shared arguments and configuration.
    pub fn client(&self) -> Result<Client> {
        Client::new(
            self.github_token.as_deref(),
            self.api_url.as_str(),
            &self.config.user_agent,
            self.config.request_timeout(),
        )
    }

    /// Build an ingestor wired to the API client and both stores.
    pub fn ingestor(&self) -> Result<Ingestor> {
        Ok(Ingestor::new(
            self.client()?,
            self.config.page_delay(),
            ArchiveWriter::new(Arc::clone(&self.objects)),
            IndexWriter::new(self.records()),
            self.config.max_items,
        ))
    }

    /// Build the read-side aggregator over the record store.
    #[must_use]
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.records(), self.config.view_limits())
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::Off => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(true)
        .init();
}

fn resolve_data_dir(data_dir: Option<&Utf8PathBuf>) -> Result<Utf8PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(dir.clone());
    }

    let dirs = ProjectDirs::from("", "", "octoindex").into_app_err("unable to determine the platform data directory")?;
    Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf())
        .map_err(|path| app_err!("data directory '{}' is not valid UTF-8", path.display()))
}
