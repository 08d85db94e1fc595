use chrono::Local;
use clap::Subcommand;
use serde::Serialize;

use super::open_store;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Forget all recent countdowns
    Clear,
}

#[derive(Serialize)]
struct Row {
    duration: String,
    hours: u8,
    minutes: u8,
    seconds: u8,
    timestamp: i64,
}

pub fn run(action: Option<HistoryAction>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store();

    if let Some(HistoryAction::Clear) = action {
        store.clear();
        println!("history cleared");
        return Ok(());
    }

    let entries = store.history();
    if json {
        let rows: Vec<Row> = entries
            .iter()
            .map(|e| {
                let cfg = e.configuration();
                Row {
                    duration: cfg.to_string(),
                    hours: cfg.hours(),
                    minutes: cfg.minutes(),
                    seconds: cfg.seconds(),
                    timestamp: e.timestamp,
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("no recent countdowns");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        let when = entry
            .started_at()
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!("{}  {:>10}  {when}", i + 1, entry.configuration().to_string());
    }
    Ok(())
}
