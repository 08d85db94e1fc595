use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

/// Environment variable holding the log filter (e.g. `countdown_core=debug`).
const LOG_ENV: &str = "COUNTDOWN_LOG";

#[derive(Parser)]
#[command(name = "countdown", version, about = "Countdown timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a countdown in the terminal
    Run(commands::run::RunArgs),
    /// Recently started countdowns
    History {
        #[command(subcommand)]
        action: Option<commands::history::HistoryAction>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Quick-select durations derived from history
    Shortcuts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::History { action, json } => commands::history::run(action, json),
        Commands::Shortcuts { json } => commands::shortcuts::run(json),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
