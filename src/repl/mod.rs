//! REPL (Read-Eval-Print Loop) engine for promsh
//!
//! This module provides an interactive shell interface with features:
//! - Line editing with reedline
//! - PromQL completion through a columnar menu, opened on Tab, after
//!   `{`, `,`, `[` and `(`, and after a label match operator
//! - History hints and persistent line history
//! - Syntax highlighting
//! - Multi-line input while brackets or strings are open

mod completer;
mod highlighter;
mod hinter;
mod prompt;
mod shared_state;
mod validator;

pub use completer::PromCompleter;
pub use highlighter::PromHighlighter;
pub use hinter::PromHinter;
pub use prompt::PromPrompt;
pub use shared_state::SharedState;
pub use validator::PromValidator;

use std::sync::Arc;

use reedline::{
    ColumnarMenu, EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::warn;

use crate::completion::{CompletionEngine, RETRIGGER_CHARACTERS, TRIGGER_CHARACTERS};
use crate::config::{HistoryConfig, OutputFormat};
use crate::error::{PromshError, Result};

const COMPLETION_MENU: &str = "completion_menu";

/// Input understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show the help text
    Help,
    /// Leave the shell
    Exit,
    /// List past queries
    History,
    /// Forget past queries
    ClearHistory,
    /// Switch the output format
    Format(OutputFormat),
    /// A PromQL expression to evaluate
    Query(String),
}

pub const HELP_TEXT: &str = "\
Enter a PromQL expression to evaluate it.

Commands:
  help              Show this help
  history           List past queries
  history clear     Forget past queries
  format <name>     Output format: table, json, json-pretty, compact
  exit, quit        Leave the shell

Press Tab to complete. Completion also opens after { , [ ( and = ~.";

/// REPL engine for interactive input
pub struct ReplEngine {
    editor: Reedline,
    prompt: PromPrompt,
    shared_state: SharedState,
    running: bool,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `shared_state` - State shared with query execution
    /// * `engine` - Completion engine backing the completion menu
    /// * `history_config` - Line history settings
    /// * `highlighting_enabled` - Enable syntax highlighting
    /// * `host` - Datasource name shown in the prompt
    pub fn new(
        shared_state: SharedState,
        engine: Arc<CompletionEngine>,
        history_config: &HistoryConfig,
        highlighting_enabled: bool,
        host: String,
    ) -> Result<Self> {
        let completion_menu = Box::new(ColumnarMenu::default().with_name(COMPLETION_MENU));
        let edit_mode = Box::new(Emacs::new(Self::keybindings()));

        let mut editor = Reedline::create()
            .with_completer(Box::new(PromCompleter::new(engine)))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode)
            .with_highlighter(Box::new(PromHighlighter::new(highlighting_enabled)))
            .with_hinter(Box::new(PromHinter::new()))
            .with_validator(Box::new(PromValidator::new()));

        if history_config.persist {
            let path = history_config.file_path.clone();
            match FileBackedHistory::with_file(history_config.max_size, path) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!(
                    "could not open line history {}: {}",
                    history_config.file_path.display(),
                    e
                ),
            }
        }

        let prompt = PromPrompt::new(host, shared_state.is_connected());

        Ok(Self {
            editor,
            prompt,
            shared_state,
            running: true,
        })
    }

    fn keybindings() -> Keybindings {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        // Typing a trigger character inserts it and opens the menu. Match
        // operators count too, so label values follow an accepted `job=`.
        for &ch in TRIGGER_CHARACTERS.iter().chain(RETRIGGER_CHARACTERS) {
            let event = ReedlineEvent::Multiple(vec![
                ReedlineEvent::Edit(vec![EditCommand::InsertChar(ch)]),
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ]);
            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Char(ch), event.clone());
            keybindings.add_binding(KeyModifiers::SHIFT, KeyCode::Char(ch), event);
        }

        keybindings
    }

    /// Read a single entry
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input, empty on Ctrl-C, None on Ctrl-D
    pub fn read_line(&mut self) -> Result<Option<String>> {
        self.prompt.set_connected(self.shared_state.is_connected());

        match self.editor.read_line(&self.prompt) {
            Ok(Signal::Success(line)) => Ok(Some(line)),
            Ok(Signal::CtrlC) => Ok(Some(String::new())),
            Ok(Signal::CtrlD) => Ok(None),
            Err(err) => Err(PromshError::Generic(format!("Read error: {}", err))),
        }
    }

    /// Turn an input line into a command
    pub fn process_input(&mut self, input: &str) -> std::result::Result<ReplCommand, String> {
        let command = parse_command(input)?;
        if command == ReplCommand::Exit {
            self.running = false;
        }
        Ok(command)
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.shared_state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

/// Parse REPL input. Anything that is not a shell command is a query.
pub fn parse_command(input: &str) -> std::result::Result<ReplCommand, String> {
    let trimmed = input.trim();
    let mut words = trimmed.split_whitespace();

    let command = match (words.next(), words.next(), words.next()) {
        (Some("help"), None, _) => ReplCommand::Help,
        (Some("exit" | "quit"), None, _) => ReplCommand::Exit,
        (Some("history"), None, _) => ReplCommand::History,
        (Some("history"), Some("clear"), None) => ReplCommand::ClearHistory,
        (Some("format"), Some(name), None) => match OutputFormat::parse(name) {
            Some(format) => ReplCommand::Format(format),
            None => return Err(format!("Unknown format '{}'", name)),
        },
        (Some("format"), None, _) => {
            return Err("Usage: format <table|json|json-pretty|compact>".to_string());
        }
        _ => ReplCommand::Query(trimmed.to_string()),
    };
    Ok(command)
}
