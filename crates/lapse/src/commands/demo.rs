//! Demo command - one session through its whole client lifecycle.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use lapse_session::{Payload, SessionStore};

use super::Context;

/// Arguments for the demo command.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Value stored under the "website" key
    #[arg(long, default_value = "longhoang.de")]
    pub website: String,
}

/// Demo result for JSON output.
#[derive(Debug, Serialize)]
struct DemoOutput {
    session_id: String,
    data: Payload,
}

/// Run the demo command.
pub async fn run(args: DemoArgs, ctx: &Context) -> Result<()> {
    let store = SessionStore::new(ctx.store_config());

    let session_id = store.create()?;
    info!(session_id = %session_id, "Created new session");

    let mut data = Payload::new();
    data.insert("website".to_string(), json!(args.website));
    store.update(&session_id, data)?;
    info!(session_id = %session_id, website = %args.website, "Updated session data");

    let data = store.get(&session_id)?;
    store.shutdown_and_wait().await;

    if ctx.json_output {
        let output = DemoOutput { session_id, data };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Session").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("ID:"), session_id);

    let mut keys: Vec<_> = data.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {} {}", dim.apply_to(format!("{key}:")), data[key]);
    }

    if ctx.verbose {
        let (min, max) = store.config().eviction_window();
        println!();
        println!(
            "  {} {}s - {}s after last update",
            dim.apply_to("Expires:"),
            min.as_secs_f64(),
            max.as_secs_f64()
        );
    }
    println!();

    Ok(())
}
