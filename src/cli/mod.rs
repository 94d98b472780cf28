//! Command-line interface for promsh
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - One-shot subcommands (classify, complete, config, completion scripts)
//! - Building the label index the completion engine reads from

mod completion;

pub use completion::generate_completion;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::completion::{CompletionEngine, Resolver, classify};
use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::Result;
use crate::formatter::Formatter;
use crate::history::QueryHistory;
use crate::index::{LabelIndex, PrometheusIndex, StaticIndex};

/// PromQL shell with context-aware autocompletion
#[derive(Parser, Debug)]
#[command(
    name = "promsh",
    version,
    about = "PromQL shell with autocompletion",
    long_about = "An interactive PromQL shell with context-aware completion of metric names,
functions, label names, label values and durations."
)]
pub struct CliArgs {
    /// Prometheus server URL
    ///
    /// Example: http://localhost:9090
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Read metric and label names from a JSON snapshot instead of a server
    #[arg(long, value_name = "FILE")]
    pub index_file: Option<PathBuf>,

    /// Output format (json, json-pretty, table, compact)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Do not check the server on startup
    #[arg(long)]
    pub no_connect: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for promsh
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print what kind of completion applies at the cursor
    Classify {
        /// PromQL text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Cursor position in characters (defaults to the end of the query)
        #[arg(long, value_name = "POS")]
        cursor: Option<usize>,
    },

    /// Print the completion items at the cursor
    Complete {
        /// PromQL text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Cursor position in characters (defaults to the end of the query)
        #[arg(long, value_name = "POS")]
        cursor: Option<usize>,
    },

    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,

        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Where completions and queries go
pub struct Datasource {
    /// Source of metric and label names
    pub index: Arc<dyn LabelIndex>,

    /// Server client, when the index is a live server
    pub server: Option<Arc<PrometheusIndex>>,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
            config.apply_env();
        }

        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Path of the configuration file in use
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_display_args(config, args);
        Self::apply_logging_args(config, args);
        Self::apply_connection_args(config, args);
    }

    fn apply_display_args(config: &mut Config, args: &CliArgs) {
        if let Some(format_str) = &args.format {
            match OutputFormat::parse(format_str) {
                Some(format) => config.display.format = format,
                None => eprintln!("Warning: Unknown format '{}', using default", format_str),
            }
        }

        if args.no_color {
            config.display.color_output = false;
        }
    }

    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    fn apply_connection_args(config: &mut Config, args: &CliArgs) {
        if let Some(url) = &args.url {
            config.datasource.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            config.datasource.timeout = timeout;
        }
        if let Some(path) = &args.index_file {
            config.datasource.index_file = Some(path.clone());
        }
    }

    /// Build the label index: a snapshot file when configured, otherwise the server
    pub fn build_datasource(&self) -> Result<Datasource> {
        let ds = &self.config.datasource;

        if let Some(path) = &ds.index_file {
            debug!("loading index snapshot from {}", path.display());
            let index = StaticIndex::load(path)?;
            return Ok(Datasource {
                index: Arc::new(index),
                server: None,
            });
        }

        let server = Arc::new(
            PrometheusIndex::new(&ds.url, self.config.request_timeout())?
                .with_lookback(self.config.lookback())
                .with_metadata_ttl(self.config.metadata_ttl()),
        );
        Ok(Datasource {
            index: server.clone(),
            server: Some(server),
        })
    }

    /// Load the query history used for history suggestions
    pub fn load_query_history(&self) -> QueryHistory {
        let history = &self.config.history;
        if !history.persist {
            return QueryHistory::new(history.max_size);
        }

        match QueryHistory::with_file(&history.query_file_path, history.max_size) {
            Ok(h) => h,
            Err(e) => {
                warn!(
                    "could not load query history from {}: {}",
                    history.query_file_path.display(),
                    e
                );
                QueryHistory::new(history.max_size)
            }
        }
    }

    /// Build a completion engine over `datasource` and `history`
    pub fn completion_engine(
        &self,
        datasource: &Datasource,
        history: Arc<RwLock<QueryHistory>>,
    ) -> CompletionEngine {
        let resolver = Resolver::new(self.config.completion.history_limit);
        CompletionEngine::new(datasource.index.clone(), history).with_resolver(resolver)
    }

    fn formatter(&self) -> Formatter {
        Formatter::new(self.config.display.format, self.config.display.color_output)
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to continue
    pub async fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Classify { query, cursor }) => {
                let offset = cursor_to_byte(query, *cursor);
                let request = classify(query, offset);
                println!("{}", self.formatter().format_request(request.as_ref())?);
                Ok(true)
            }
            Some(Commands::Complete { query, cursor }) => {
                self.run_complete(query, *cursor).await?;
                Ok(true)
            }
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                generate_completion(shell, &mut std::io::stdout())?;
                Ok(true)
            }
            Some(Commands::Config {
                show,
                validate,
                init,
            }) => {
                self.handle_config_command(*show, *validate, *init)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_complete(&self, query: &str, cursor: Option<usize>) -> Result<()> {
        let datasource = self.build_datasource()?;
        let history = Arc::new(RwLock::new(self.load_query_history()));
        let engine = self.completion_engine(&datasource, history);

        let offset = cursor_to_byte(query, cursor);
        let completions = engine.complete(query, offset).await?;
        println!("{}", self.formatter().format_completions(&completions)?);
        Ok(())
    }

    fn show_version(&self) {
        println!("promsh version {}", env!("CARGO_PKG_VERSION"));
    }

    fn handle_config_command(&self, show: bool, validate: bool, init: bool) -> Result<()> {
        if init {
            let path = self.config_path();
            if self.init_config_file()? {
                println!("✅ Wrote default configuration to {}", path.display());
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }

        if validate {
            self.validate_config_file();
        }

        if show {
            self.show_config();
        }

        Ok(())
    }

    /// Write the default configuration to the config path.
    /// Returns false when a file is already there.
    fn init_config_file(&self) -> Result<bool> {
        let path = self.config_path();
        if path.exists() {
            return Ok(false);
        }
        Config::default().save(&path)?;
        Ok(true)
    }

    fn validate_config_file(&self) {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return;
        }

        match Config::from_file(&path) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }
    }

    fn show_config(&self) {
        println!("Configuration file: {}", self.config_path().display());
        println!();
        println!("=== Effective Configuration ===");
        println!();

        match self.config.to_toml() {
            Ok(toml_str) => println!("{}", toml_str),
            Err(e) => {
                eprintln!("Error formatting configuration: {}", e);
                println!("{:#?}", self.config);
            }
        }
    }

    /// Print banner with version and datasource
    pub fn print_banner(&self) {
        if self.args.quiet {
            return;
        }
        match &self.config.datasource.index_file {
            Some(path) => println!("Using index snapshot: {}", path.display()),
            None => println!("Connecting to: {}", self.config.datasource.url),
        }
        println!("Using promsh: {}", env!("CARGO_PKG_VERSION"));
    }

    /// Print server version after the connectivity check
    pub fn print_connection_info(&self, version: &str) {
        if !self.args.quiet {
            println!("Using Prometheus: {}", version);
        }
    }
}

/// Convert a cursor given in characters to a byte offset into `query`
fn cursor_to_byte(query: &str, cursor: Option<usize>) -> usize {
    match cursor {
        Some(c) => query
            .char_indices()
            .nth(c)
            .map(|(i, _)| i)
            .unwrap_or(query.len()),
        None => query.len(),
    }
}
