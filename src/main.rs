//! Main entry point for the ytdr CLI

use anyhow::Context;
use clap::Parser;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytdr::cli::output::spawn_progress_consumer;
use ytdr::cli::{Args, OutputFormatter, VerbosityLevel};
use ytdr::platform::HttpClientConfig;
use ytdr::Downloader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity_level())?;
    debug!("Starting ytdr with args: {:?}", args);

    let formatter = OutputFormatter::new(args.verbosity_level());
    if let Err(e) = run(&args, &formatter).await {
        formatter.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: &Args, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let http_config = HttpClientConfig {
        connect_timeout: args.connect_timeout_duration(),
        socks5_proxy: args.proxy.clone(),
        ..HttpClientConfig::default()
    };
    let mut downloader = Downloader::new().with_http_config(http_config);
    let progress = downloader
        .take_progress_receiver()
        .context("progress receiver already taken")?;

    downloader
        .decode_url(&args.url)
        .await
        .with_context(|| format!("failed to resolve {}", args.url))?;

    if args.info {
        if let Some(itag_info) = downloader.itag_info() {
            formatter.print_itag_info(&itag_info);
        }
        return Ok(());
    }

    let selection = args.selection();
    let stream = downloader.select(&selection)?;

    if args.print_url {
        println!("{}", stream.url);
        return Ok(());
    }

    formatter.print_download_start(stream);
    if args.proxy.is_some() {
        formatter.info("Routing requests through the SOCKS5 proxy");
    }

    let progress_bar = if args.no_progress {
        None
    } else {
        formatter.create_progress_bar()
    };
    let consumer = spawn_progress_consumer(progress, progress_bar);

    let output_path = downloader
        .start_download(
            args.directory.as_deref(),
            args.output.as_deref(),
            &selection,
        )
        .await
        .context("download failed")?;

    // closes the progress channel
    drop(downloader);
    if let Ok(Some(last)) = consumer.await {
        debug!("Last progress level: {}%", last);
    }

    info!("Saved {}", output_path.display());
    let size = tokio::fs::metadata(&output_path).await.ok().map(|m| m.len());
    formatter.print_download_complete(&output_path, size, start_time.elapsed());

    Ok(())
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}
