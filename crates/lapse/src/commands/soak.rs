//! Soak command - concurrent clients against one store.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::Args;
use console::{Style, style};
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use lapse_session::{Error, Payload, SessionStore};

use super::Context;

/// Arguments for the soak command.
#[derive(Args, Debug)]
pub struct SoakArgs {
    /// Number of concurrent client threads
    #[arg(short, long, default_value = "8")]
    pub workers: usize,

    /// How long the clients run, in seconds
    #[arg(short, long, default_value = "5")]
    pub duration_secs: u64,

    /// Sessions each client creates at most; further create draws become reads
    #[arg(short, long, default_value = "64")]
    pub sessions: usize,

    /// After the run, wait out the eviction window and require an empty table
    #[arg(long)]
    pub drain: bool,
}

/// Per-worker and aggregate operation counts.
#[derive(Debug, Default, Clone, Copy, Serialize)]
struct SoakReport {
    creates: u64,
    gets: u64,
    updates: u64,
    not_found: u64,
    id_failures: u64,
}

impl SoakReport {
    fn add(&mut self, other: &SoakReport) {
        self.creates += other.creates;
        self.gets += other.gets;
        self.updates += other.updates;
        self.not_found += other.not_found;
        self.id_failures += other.id_failures;
    }
}

/// Soak summary for JSON output.
#[derive(Debug, Serialize)]
struct SoakOutput {
    workers: usize,
    duration_secs: u64,
    sessions: usize,
    report: SoakReport,
    stats: lapse_session::StoreStats,
    drained: Option<bool>,
}

/// Run the soak command.
pub async fn run(args: SoakArgs, ctx: &Context) -> Result<()> {
    if args.workers == 0 {
        bail!("--workers must be at least 1");
    }
    if args.sessions == 0 {
        bail!("--sessions must be at least 1");
    }

    let store = SessionStore::new(ctx.store_config());
    let deadline = Instant::now() + Duration::from_secs(args.duration_secs);
    info!(
        workers = args.workers,
        duration_secs = args.duration_secs,
        sessions = args.sessions,
        "Starting soak run"
    );

    let mut handles = Vec::with_capacity(args.workers);
    for worker in 0..args.workers {
        let store = store.clone();
        let sessions = args.sessions;
        handles.push(tokio::task::spawn_blocking(move || {
            client_loop(&store, worker, sessions, deadline)
        }));
    }

    let mut report = SoakReport::default();
    for handle in handles {
        report.add(&handle.await?);
    }

    let drained = if args.drain {
        let (_, latest) = store.config().eviction_window();
        debug!(wait_ms = latest.as_millis() as u64, "Waiting for table to drain");
        tokio::time::sleep(latest + store.config().sweep_interval).await;
        Some(store.is_empty())
    } else {
        None
    };

    let stats = store.stats();
    store.shutdown_and_wait().await;

    if ctx.json_output {
        let output = SoakOutput {
            workers: args.workers,
            duration_secs: args.duration_secs,
            sessions: args.sessions,
            report,
            stats,
            drained,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&args, &report, &stats, drained);
    }

    if report.id_failures > 0 {
        bail!("{} session ID generation failures", report.id_failures);
    }
    if drained == Some(false) {
        bail!("{} sessions outlived the eviction window", stats.live);
    }
    Ok(())
}

/// Random Create/Get/Update until `deadline`, creating at most `max_sessions`.
fn client_loop(
    store: &SessionStore,
    worker: usize,
    max_sessions: usize,
    deadline: Instant,
) -> SoakReport {
    let mut rng = rand::rng();
    let mut ids: Vec<String> = Vec::with_capacity(max_sessions);
    let mut report = SoakReport::default();

    while Instant::now() < deadline {
        let mut op = rng.random_range(0..3);
        if op == 0 && report.creates >= max_sessions as u64 {
            op = 1;
        }
        let result = match op {
            0 => {
                report.creates += 1;
                store.create().map(|id| ids.push(id))
            }
            1 => {
                report.gets += 1;
                match pick(&mut rng, &ids) {
                    Some(id) => store.get(id).map(|_| ()),
                    None => store.get("unissued").map(|_| ()),
                }
            }
            _ => {
                report.updates += 1;
                let mut data = Payload::new();
                data.insert("worker".to_string(), json!(worker));
                data.insert("seq".to_string(), json!(report.updates));
                match pick(&mut rng, &ids) {
                    Some(id) => store.update(id, data),
                    None => store.update("unissued", data),
                }
            }
        };

        match result {
            Ok(()) => {}
            Err(Error::NotFound(_)) => report.not_found += 1,
            Err(Error::IdGeneration(_)) => report.id_failures += 1,
        }
    }

    report
}

fn pick<'a>(rng: &mut impl Rng, ids: &'a [String]) -> Option<&'a str> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[rng.random_range(0..ids.len())].as_str())
    }
}

fn print_report(
    args: &SoakArgs,
    report: &SoakReport,
    stats: &lapse_session::StoreStats,
    drained: Option<bool>,
) {
    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();

    println!();
    println!(
        "{}",
        style(format!(
            "Soak: {} workers for {}s, up to {} sessions each",
            args.workers, args.duration_secs, args.sessions
        ))
        .bold()
    );
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Creates:"), report.creates);
    println!("  {} {}", dim.apply_to("Gets:"), report.gets);
    println!("  {} {}", dim.apply_to("Updates:"), report.updates);
    println!("  {} {}", dim.apply_to("Not found:"), report.not_found);
    println!("  {} {}", dim.apply_to("ID failures:"), report.id_failures);
    println!();
    println!("  {} {}", dim.apply_to("Live:"), stats.live);
    println!("  {} {}", dim.apply_to("Evicted:"), stats.evicted);

    match drained {
        Some(true) => println!("  {} {}", dim.apply_to("Drain:"), green.apply_to("● empty")),
        Some(false) => println!("  {} {}", dim.apply_to("Drain:"), red.apply_to("● leaked")),
        None => {}
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapse_session::StoreConfig;

    #[tokio::test]
    async fn test_client_respects_session_cap() {
        let store = SessionStore::new(
            StoreConfig::new()
                .with_max_age(Duration::from_secs(60))
                .with_sweep_interval(Duration::from_secs(1)),
        );
        let deadline = Instant::now() + Duration::from_millis(100);

        let worker_store = store.clone();
        let report = tokio::task::spawn_blocking(move || {
            client_loop(&worker_store, 0, 10, deadline)
        })
        .await
        .unwrap();

        assert_eq!(report.creates, 10);
        assert_eq!(store.len(), 10);
        assert_eq!(report.id_failures, 0);
        assert!(report.gets > 0);
        store.shutdown_and_wait().await;
    }

    #[test]
    fn test_pick_from_empty_is_none() {
        let mut rng = rand::rng();
        assert!(pick(&mut rng, &[]).is_none());
        let ids = vec!["a".to_string()];
        assert_eq!(pick(&mut rng, &ids), Some("a"));
    }
}
