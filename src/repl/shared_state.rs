use std::sync::{Arc, RwLock};

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::Result;
use crate::history::{PastQuery, QueryHistory};

/// State shared between the REPL, the completer and query execution.
#[derive(Debug, Clone)]
pub struct SharedState {
    /// Submitted queries, also read by the completion engine
    pub history: Arc<RwLock<QueryHistory>>,

    /// Whether the server answered the last connectivity check
    pub connected: Arc<RwLock<bool>>,

    /// Server version
    pub server_version: Arc<RwLock<Option<String>>>,

    /// Output format setting
    pub output_format: Arc<RwLock<OutputFormat>>,

    /// Color output setting
    pub color_enabled: Arc<RwLock<bool>>,
}

impl SharedState {
    /// Create a new shared state around `history`.
    pub fn new(history: QueryHistory) -> Self {
        Self::with_config(history, &DisplayConfig::default())
    }

    /// Create a new shared state with display configuration.
    pub fn with_config(history: QueryHistory, display_config: &DisplayConfig) -> Self {
        Self {
            history: Arc::new(RwLock::new(history)),
            connected: Arc::new(RwLock::new(false)),
            server_version: Arc::new(RwLock::new(None)),
            output_format: Arc::new(RwLock::new(display_config.format)),
            color_enabled: Arc::new(RwLock::new(display_config.color_output)),
        }
    }

    /// Record a submitted query.
    pub fn record_query(&self, expr: &str) -> Result<()> {
        match self.history.write() {
            Ok(mut history) => history.record(expr),
            Err(_) => Ok(()),
        }
    }

    /// Past queries, most recent first.
    pub fn past_queries(&self) -> Vec<PastQuery> {
        self.history
            .read()
            .map(|h| h.entries())
            .unwrap_or_default()
    }

    /// Drop all past queries.
    pub fn clear_history(&self) -> Result<()> {
        match self.history.write() {
            Ok(mut history) => history.clear(),
            Err(_) => Ok(()),
        }
    }

    /// Get current output format.
    pub fn get_format(&self) -> OutputFormat {
        self.output_format
            .read()
            .map(|f| *f)
            .unwrap_or(OutputFormat::Table)
    }

    /// Set output format.
    pub fn set_format(&self, format: OutputFormat) {
        if let Ok(mut f) = self.output_format.write() {
            *f = format;
        }
    }

    /// Get current color setting.
    pub fn get_color_enabled(&self) -> bool {
        self.color_enabled.read().map(|c| *c).unwrap_or(false)
    }

    /// Set color output.
    pub fn set_color_enabled(&self, enabled: bool) {
        if let Ok(mut c) = self.color_enabled.write() {
            *c = enabled;
        }
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.connected.read().map(|c| *c).unwrap_or(false)
    }

    /// Mark as connected and update server version.
    pub fn set_connected(&self, version: Option<String>) {
        if let Ok(mut c) = self.connected.write() {
            *c = true;
        }
        if let Ok(mut v) = self.server_version.write() {
            *v = version;
        }
    }

    /// Mark as disconnected.
    pub fn set_disconnected(&self) {
        if let Ok(mut c) = self.connected.write() {
            *c = false;
        }
        if let Ok(mut v) = self.server_version.write() {
            *v = None;
        }
    }

    /// Get server version.
    pub fn get_server_version(&self) -> Option<String> {
        self.server_version.read().ok().and_then(|v| v.clone())
    }
}
