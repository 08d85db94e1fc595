use countdown_core::AppConfig;

use super::open_store;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_or_default();
    let store = open_store();
    let shortcuts = store.shortcuts(config.default_shortcuts());

    if json {
        println!("{}", serde_json::to_string_pretty(&shortcuts)?);
        return Ok(());
    }
    for (i, shortcut) in shortcuts.iter().enumerate() {
        println!("{}  {shortcut}", i + 1);
    }
    Ok(())
}
