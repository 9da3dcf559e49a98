//! Config command - show the effective configuration.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use lapse_config::{LapseConfig, LayerStatus};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print only the config file paths that were checked
    #[arg(long)]
    pub sources: bool,
}

/// Config summary for JSON output.
#[derive(Debug, Serialize)]
struct ConfigOutput<'a> {
    config: LapseConfig,
    loaded_from: Vec<String>,
    warnings: &'a [String],
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    // Show every section, defaults included.
    let effective = LapseConfig {
        session: Some(loaded.config.session()),
        logging: Some(loaded.config.logging()),
    };

    if ctx.json_output {
        let output = ConfigOutput {
            config: effective,
            loaded_from: loaded
                .loaded_from()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            warnings: &loaded.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();

    println!("{}", style("# Config sources").bold());
    for layer in &loaded.layers {
        let marker = match &layer.status {
            LayerStatus::Loaded => green.apply_to("● loaded").to_string(),
            LayerStatus::Missing => dim.apply_to("○ absent").to_string(),
            LayerStatus::Rejected(_) => red.apply_to("✗ skipped").to_string(),
        };
        println!("# {} {}", marker, layer.path.display());
    }

    if args.sources {
        return Ok(());
    }

    for warning in &loaded.warnings {
        println!("# warning: {}", warning);
    }

    println!();
    print!("{}", effective.to_toml()?);
    Ok(())
}
