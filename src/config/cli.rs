use crate::config::toml_config::{CycleConfig, DiscoveryConfig, IngestConfig};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "olympiad-etl")]
#[command(about = "Scrape olympiad schedules and normalize their deadlines")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "olympiads.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the academic cycle start year from config
    #[arg(long)]
    pub cycle_start_year: Option<i32>,

    /// Override the output directory from config
    #[arg(long)]
    pub output: Option<String>,

    /// Discover additional sources from this seed page
    #[arg(long)]
    pub discover: Option<String>,

    /// Show what would be processed without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Applies command-line overrides on top of the loaded file.
    pub fn apply_overrides(&self, config: &mut IngestConfig) {
        if let Some(year) = self.cycle_start_year {
            config.cycle = Some(CycleConfig {
                start_year: Some(year),
            });
            tracing::info!("🔧 Academic cycle overridden to start in {}", year);
        }

        if let Some(output) = &self.output {
            config.output.path = output.clone();
            tracing::info!("🔧 Output path overridden to: {}", output);
        }

        if let Some(seed_url) = &self.discover {
            config.discovery = Some(DiscoveryConfig {
                seed_url: seed_url.clone(),
            });
        }
    }
}
