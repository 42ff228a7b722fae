// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
//   toc-crawler crawl https://steampipe.io/docs --toc-selector "div.mt-2 a"
//   toc-crawler crawl --preset powerpipe --json
//   toc-crawler presets
// =============================================================================

use clap::{Args, Parser, Subcommand};

use crate::config::{Preset, DEFAULT_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "toc-crawler",
    version,
    about = "Crawls a documentation site and reports broken links and pages missing from its TOC",
    long_about = "toc-crawler walks every internal page reachable from a documentation root, \
                  records which pages the table-of-contents sidebar declares, and reports \
                  every 404 together with the page that linked to it."
)]
pub struct Cli {
    /// Show debug logs (skipped URLs, every enqueued link)
    ///
    /// RUST_LOG, when set, takes precedence over this flag
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a documentation site
    ///
    /// Example: toc-crawler crawl https://flowpipe.io/docs --toc-selector "div.mt-2 a"
    Crawl(CrawlArgs),

    /// List the built-in site presets
    Presets,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Documentation root; also the prefix that makes a URL "internal"
    ///
    /// Optional when --preset is given
    pub base_url: Option<String>,

    /// Use the base URL and TOC selector of a known site
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// CSS selector for the TOC sidebar anchors (e.g. "div.mt-2 a")
    #[arg(long)]
    pub toc_selector: Option<String>,

    /// CSS selector for body links to follow; TOC anchors are always excluded
    #[arg(long)]
    pub link_selector: Option<String>,

    /// Number of pages fetched at the same time
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Stop after dispatching this many requests
    #[arg(long)]
    pub max_requests: Option<usize>,

    /// Stop dispatching new requests after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Additional start URL (repeatable); its referrer is reported as "Unknown"
    #[arg(long = "seed", value_name = "URL")]
    pub seeds: Vec<String>,

    /// Output the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Also list crawled pages that are not declared in the TOC
    #[arg(long)]
    pub show_undeclared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crawl_defaults() {
        let cli = Cli::try_parse_from(["toc-crawler", "crawl", "https://site/docs"]).unwrap();
        assert!(!cli.verbose);

        let Commands::Crawl(args) = cli.command else {
            panic!("expected crawl command");
        };
        assert_eq!(args.base_url.as_deref(), Some("https://site/docs"));
        assert_eq!(args.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(args.request_timeout, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(args.seeds.is_empty());
        assert!(!args.json);
    }

    #[test]
    fn test_parse_global_verbose_and_presets() {
        let cli = Cli::try_parse_from(["toc-crawler", "presets", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Presets));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let result = Cli::try_parse_from(["toc-crawler", "crawl", "--preset", "nope"]);
        assert!(result.is_err());
    }
}
