//! Watch command - observe evictions as the sweeper makes them.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use lapse_session::{SessionEvent, SessionStore};

use super::Context;

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Number of sessions to create
    #[arg(short, long, default_value = "5")]
    pub sessions: usize,
}

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let store = SessionStore::new(ctx.store_config());
    let mut events = store.subscribe();
    let dim = Style::new().dim();

    for _ in 0..args.sessions {
        let id = store.create()?;
        if !ctx.json_output {
            println!("{} {}", dim.apply_to("created"), id);
        }
    }

    // One sweep pass can evict every session at once, so count events
    // rather than polling the table.
    let poll = store.config().sweep_interval * 2;
    let (_, latest) = store.config().eviction_window();
    let deadline = tokio::time::Instant::now() + latest + poll;
    let mut seen = 0usize;

    while seen < args.sessions {
        if tokio::time::Instant::now() > deadline {
            store.shutdown_and_wait().await;
            bail!(
                "saw {} of {} evictions within the eviction window ({} sessions still present)",
                seen,
                args.sessions,
                store.len()
            );
        }

        match tokio::time::timeout(poll, events.recv()).await {
            Ok(Ok(SessionEvent::Evicted { id, idle, lifetime })) => {
                seen += 1;
                if ctx.json_output {
                    println!(
                        "{}",
                        json!({
                            "event": "evicted",
                            "id": id,
                            "idle_ms": idle.as_millis() as u64,
                            "lifetime_ms": lifetime.as_millis() as u64,
                        })
                    );
                } else {
                    println!(
                        "{} {} {}",
                        dim.apply_to("evicted"),
                        id,
                        dim.apply_to(format!(
                            "(idle {:.1}s, lived {:.1}s)",
                            idle.as_secs_f64(),
                            lifetime.as_secs_f64()
                        ))
                    );
                }
            }
            Ok(Err(RecvError::Lagged(skipped))) => {
                warn!(skipped, "Eviction events dropped; watcher fell behind");
                seen += skipped as usize;
            }
            Ok(Err(RecvError::Closed)) => break,
            Err(_) => {}
        }
    }

    store.shutdown_and_wait().await;

    if !ctx.json_output {
        println!();
        println!("{} {}", dim.apply_to("Evicted:"), seen);
    }
    Ok(())
}
