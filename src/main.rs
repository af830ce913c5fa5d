use anyhow::Context;
use clap::Parser;
use olympiad_etl::core::pipeline::merge_listings;
use olympiad_etl::domain::ports::ConfigProvider;
use olympiad_etl::utils::error::{ErrorSeverity, EtlError};
use olympiad_etl::utils::{logger, validation::Validate};
use olympiad_etl::{
    CliArgs, DeadlineParser, EtlEngine, FileRecordSink, HttpFetcher, IngestConfig,
    IngestionPipeline, LocalStorage,
};

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Ingestion failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Logging
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting olympiad-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = IngestConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let cycle = config.academic_cycle();
    let formats = config.output_formats()?;
    tracing::info!(
        "✅ Configuration '{}' loaded: {} sources, cycle {}/{}, output {}",
        config.pipeline.name,
        config.sources().len(),
        cycle.start_year,
        cycle.start_year + 1,
        config.output_path()
    );

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No pages will be fetched");
        for listing in config.sources() {
            println!("{}\t{}", listing.name, listing.url);
        }
        if let Some(seed) = config.discovery_seed() {
            println!("(discovery seed) {}", seed);
        }
        return Ok(());
    }

    let fetcher = match HttpFetcher::from_config(&config, config.user_agent(), &config.headers()) {
        Ok(fetcher) => fetcher,
        Err(e) => exit_with(&e),
    };
    let pipeline = IngestionPipeline::new(fetcher, DeadlineParser::new(cycle))
        .with_concurrency(config.concurrent_requests());

    let mut listings = config.sources().to_vec();
    if let Some(seed) = config.discovery_seed() {
        match pipeline.discover(seed).await {
            Ok(found) => merge_listings(&mut listings, found),
            Err(e) => {
                tracing::warn!("⚠️ Discovery from {} failed: {}", seed, e);
            }
        }
    }

    let storage = LocalStorage::new(config.output_path());
    let sink = FileRecordSink::new(storage, formats);
    let engine = EtlEngine::new(pipeline, sink);

    match engine.run(&listings).await {
        Ok(report) => {
            for failure in &report.failures {
                tracing::warn!("Source {} failed: {}", failure.listing.url, failure.error);
            }
            for skipped in &report.skipped {
                tracing::warn!(
                    "Skipped '{}' from {}: {}",
                    skipped.token.label,
                    skipped.source_url,
                    skipped.error
                );
            }
            tracing::info!("✅ Ingestion completed: {}", report);
            println!("✅ {}", report);
            println!("📁 Output saved to: {}", config.output_path());
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
