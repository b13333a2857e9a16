use ecotracker::{
    ConfigFlow, DeviceClient, EntryStore, FileStore, FlowResult, MessageLogMode,
};
use serde_json::{Map, Value, json};
use std::env;

const USAGE: &str = "usage: setup <ip> [--interval <secs>] [--store <path>] \
                     [--reconfigure <entry_id>] [--log <path>]";

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[tokio::main]
async fn main() -> ecotracker::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let ip = args.get(1).expect(USAGE);
    let store_path = flag(&args, "--store").unwrap_or("ecotracker_entries.json");

    let mut input = Map::new();
    input.insert("ip_address".to_string(), json!(ip));
    if let Some(interval) = flag(&args, "--interval") {
        // Passed through as text; the schema coerces it.
        input.insert("scan_interval".to_string(), json!(interval));
    }
    let input = Value::Object(input);

    let mut client = DeviceClient::builder();
    if let Some(path) = flag(&args, "--log") {
        println!("Logging device exchanges to {path}");
        client = client.message_log(MessageLogMode::Full, path);
    }

    let store = FileStore::open(store_path)?;
    let mut flow = ConfigFlow::builder(client.build()?, store)
        .on_entry_created(|entry| println!("Created {} ({})", entry.title, entry.entry_id))
        .on_entry_updated(|entry| println!("Updated {} ({})", entry.title, entry.entry_id))
        .build();

    let result = match flag(&args, "--reconfigure") {
        Some(entry_id) => flow.step_reconfigure(entry_id, Some(&input)).await,
        None => flow.step_user(Some(&input)).await,
    };

    match &result {
        FlowResult::Form { errors, .. } => {
            for (field, code) in errors {
                eprintln!("{field}: {code}");
            }
        }
        FlowResult::CreateEntry { .. } | FlowResult::Abort { .. } => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    println!(
        "{} entr{} in {}",
        flow.store().entries().len(),
        if flow.store().entries().len() == 1 { "y" } else { "ies" },
        flow.store().path().display()
    );
    Ok(())
}
