//! promsh - PromQL shell
//!
//! Interactive PromQL REPL with context-aware autocompletion.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! promsh http://localhost:9090
//!
//! # One-shot completion
//! promsh complete 'sum by (' --cursor 8
//! ```

use std::sync::Arc;

use tracing::{Level, debug};

use promsh::cli::{CliInterface, Datasource};
use promsh::error::{IndexError, PromshError, Result};
use promsh::formatter::Formatter;
use promsh::repl::{HELP_TEXT, ReplCommand, ReplEngine, SharedState};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or start the REPL
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    cli.print_banner();

    run_interactive_mode(&cli).await
}

/// Run application in interactive REPL mode
async fn run_interactive_mode(cli: &CliInterface) -> Result<()> {
    let datasource = cli.build_datasource()?;
    let shared_state = initialize_shared_state(cli);
    check_connection(cli, &datasource, &shared_state).await;

    let engine = Arc::new(cli.completion_engine(&datasource, shared_state.history.clone()));
    let host = match &cli.config().datasource.index_file {
        Some(path) => path.display().to_string(),
        None => cli.config().datasource.host(),
    };
    let mut repl = ReplEngine::new(
        shared_state.clone(),
        engine,
        &cli.config().history,
        cli.config().display.syntax_highlighting,
        host,
    )?;

    run_repl_loop(&mut repl, &datasource, &shared_state).await?;

    println!("Goodbye!");
    Ok(())
}

fn initialize_shared_state(cli: &CliInterface) -> SharedState {
    let history = cli.load_query_history();
    SharedState::with_config(history, &cli.config().display)
}

/// Ask the server for its version; a snapshot counts as always connected
async fn check_connection(cli: &CliInterface, datasource: &Datasource, state: &SharedState) {
    let Some(server) = &datasource.server else {
        state.set_connected(None);
        return;
    };

    if cli.args().no_connect {
        return;
    }

    match server.build_info().await {
        Ok(version) => {
            cli.print_connection_info(&version);
            state.set_connected(Some(version));
        }
        Err(e) => {
            eprintln!("Warning: {}", e);
            state.set_disconnected();
        }
    }
}

/// Main REPL loop
async fn run_repl_loop(
    repl: &mut ReplEngine,
    datasource: &Datasource,
    shared_state: &SharedState,
) -> Result<()> {
    while repl.is_running() {
        let input = match repl.read_line()? {
            Some(line) if !line.trim().is_empty() => line,
            Some(_) => continue,
            None => break,
        };

        let command = match repl.process_input(&input) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        execute_and_display(command, datasource, shared_state).await;
    }

    Ok(())
}

fn formatter(state: &SharedState) -> Formatter {
    Formatter::new(state.get_format(), state.get_color_enabled())
}

/// Execute a REPL command and print its output
async fn execute_and_display(command: ReplCommand, datasource: &Datasource, state: &SharedState) {
    match command {
        ReplCommand::Exit => {}
        ReplCommand::Help => println!("{}", HELP_TEXT),
        ReplCommand::History => match formatter(state).format_history(&state.past_queries()) {
            Ok(output) => println!("{}", output),
            Err(e) => eprintln!("Format error: {}", e),
        },
        ReplCommand::ClearHistory => {
            if let Err(e) = state.clear_history() {
                eprintln!("{}", e);
            }
        }
        ReplCommand::Format(format) => state.set_format(format),
        ReplCommand::Query(expr) => {
            if let Err(e) = state.record_query(&expr) {
                eprintln!("Warning: could not save query: {}", e);
            }
            run_query(&expr, datasource, state).await;
        }
    }
}

async fn run_query(expr: &str, datasource: &Datasource, state: &SharedState) {
    let Some(server) = &datasource.server else {
        println!("Queries need a server; the snapshot only provides completions.");
        return;
    };

    debug!("evaluating {}", expr);
    match server.instant_query(expr).await {
        Ok(result) => {
            state.set_connected(state.get_server_version());
            match formatter(state).format_query_result(&result) {
                Ok(output) => println!("{}", output),
                Err(e) => eprintln!("Format error: {}", e),
            }
        }
        Err(e) => {
            if matches!(e, PromshError::Index(IndexError::Request(_))) {
                state.set_disconnected();
            }
            eprintln!("{}", e);
        }
    }
}

/// Initialize logging system based on the configured level
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
