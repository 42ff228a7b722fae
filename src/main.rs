// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) on stderr
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the crawl report (table or JSON) on stdout
// 5. Exit with proper code (0 = success, 1 = broken links, 2 = error)
// =============================================================================

use anyhow::Result;
use clap::Parser;
use futures::stream::{self, Stream, StreamExt};
use tracing_subscriber::EnvFilter;

use toc_crawler::cli::{Cli, Commands, CrawlArgs};
use toc_crawler::config::{Preset, SiteConfig};
use toc_crawler::crawl::{CrawlReport, Crawler};
use toc_crawler::page::{HttpRenderer, SelectorExtractor};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no reportable broken links
//   Ok(1) = broken links found
//   Err   = bad configuration or unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Crawl(args) => handle_crawl(&args).await,
        Commands::Presets => {
            print_presets();
            Ok(0)
        }
    }
}

// RUST_LOG wins when set; otherwise info, or debug with --verbose.
// Logs go to stderr so stdout only carries the report.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_crawl(args: &CrawlArgs) -> Result<i32> {
    let config = SiteConfig::from_args(args)?;
    let renderer = HttpRenderer::new(config.request_timeout)?;
    let extractor = SelectorExtractor::new(&config.toc_selector, &config.link_selector)?;

    tracing::info!(
        "Crawling {} (TOC selector '{}', link selector '{}', concurrency {})",
        config.scope.root(),
        config.toc_selector,
        config.link_selector,
        config.concurrency
    );

    let crawler = Crawler::new(config, renderer, extractor);

    // First Ctrl-C stops dispatching and lets in-flight pages finish,
    // a second one exits right away
    let cancel = crawler.cancel_handle();
    let interrupts = Box::pin(stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    }));
    tokio::spawn(async move {
        if second_interrupt(interrupts, move || cancel.cancel()).await {
            tracing::warn!("Interrupted again, exiting without waiting for in-flight pages");
            std::process::exit(2);
        }
    });

    let report = crawler.run().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.show_undeclared);
    }

    Ok(if report.has_broken_links() { 1 } else { 0 })
}

// Calls `cancel` on the first interrupt and returns true on the second.
// Returns false if the interrupt stream ends first.
async fn second_interrupt<S, F>(mut interrupts: S, cancel: F) -> bool
where
    S: Stream<Item = ()> + Unpin,
    F: FnOnce(),
{
    if interrupts.next().await.is_none() {
        return false;
    }
    cancel();
    interrupts.next().await.is_some()
}

fn print_presets() {
    println!("{:<12} {:<40} {:<20}", "PRESET", "BASE URL", "TOC SELECTOR");
    println!("{}", "=".repeat(72));
    for preset in [
        Preset::Guardrails,
        Preset::Flowpipe,
        Preset::Steampipe,
        Preset::Powerpipe,
    ] {
        println!(
            "{:<12} {:<40} {:<20}",
            preset.to_string(),
            preset.base_url(),
            preset.toc_selector()
        );
    }
}

const URL_COLUMN: usize = 60;
const REFERRER_COLUMN: usize = 45;

// Prints the report as a human-readable table in the terminal
fn print_report(report: &CrawlReport, show_undeclared: bool) {
    if report.broken_links.is_empty() {
        println!("✅ No 404 errors found.");
    } else {
        println!(
            "{:<url_w$} {:<ref_w$}",
            "404 URL",
            "REFERRER",
            url_w = URL_COLUMN,
            ref_w = REFERRER_COLUMN
        );
        println!("{}", "=".repeat(URL_COLUMN + 1 + REFERRER_COLUMN));

        for record in &report.broken_links {
            println!(
                "{:<url_w$} {:<ref_w$}",
                truncate(record.url.as_str(), URL_COLUMN),
                truncate(&record.referrer.to_string(), REFERRER_COLUMN),
                url_w = URL_COLUMN,
                ref_w = REFERRER_COLUMN
            );
        }
    }

    if !report.failed_requests.is_empty() {
        println!("\n⚠️  Requests that could not be fetched:");
        for failed in &report.failed_requests {
            println!("   {} (referrer: {})", failed.error, failed.referrer);
        }
    }

    if show_undeclared && !report.undeclared_pages.is_empty() {
        println!("\n📄 Pages not declared in the TOC:");
        for page in &report.undeclared_pages {
            println!("   {}", page);
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   📄 Processed URLs: {}", report.processed_count);
    println!("   📥 Enqueued URLs: {}", report.enqueued_count);
    println!("   📑 TOC links: {}", report.toc_count);
    println!("   ❌ 404 errors: {}", report.broken_count);
    if report.cancelled {
        println!("   ⏹️  Crawl stopped early, some pages were not visited");
    }
}

// Shortens long URLs to at most `max` chars so the table columns stay aligned
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
