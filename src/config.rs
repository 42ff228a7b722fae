// src/config.rs
// =============================================================================
// Per-site crawl configuration.
//
// A SiteConfig says which site to crawl (base_url, which is both the crawl
// root and the "internal" prefix), how to recognise its TOC sidebar
// (toc_selector) and which other anchors to follow (link_selector), plus a
// few limits for the crawl loop.
//
// The documentation sites this tool was written for ship as presets, so
// `toc-crawler crawl --preset steampipe` works without any selectors.
// =============================================================================

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use crate::cli::CrawlArgs;
use crate::crawl::SiteScope;
use crate::error::ConfigError;

// Used when neither --toc-selector nor --preset is given
pub const DEFAULT_TOC_SELECTOR: &str = "nav a";
pub const DEFAULT_LINK_SELECTOR: &str = "a[href]";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Known documentation sites with their base URL and TOC selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Guardrails,
    Flowpipe,
    Steampipe,
    Powerpipe,
}

impl Preset {
    pub fn base_url(self) -> &'static str {
        match self {
            Preset::Guardrails => "https://turbot.com/guardrails/docs",
            Preset::Flowpipe => "https://flowpipe.io/docs",
            Preset::Steampipe => "https://steampipe.io/docs",
            Preset::Powerpipe => "https://powerpipe.io/docs",
        }
    }

    pub fn toc_selector(self) -> &'static str {
        match self {
            Preset::Guardrails => "div.hidden a",
            Preset::Flowpipe | Preset::Steampipe | Preset::Powerpipe => "div.mt-2 a",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Guardrails => "guardrails",
            Preset::Flowpipe => "flowpipe",
            Preset::Steampipe => "steampipe",
            Preset::Powerpipe => "powerpipe",
        };
        f.write_str(name)
    }
}

/// Validated settings for one crawl.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub scope: SiteScope,
    pub toc_selector: String,
    pub link_selector: String,
    /// Page handlers allowed in flight at once
    pub concurrency: usize,
    /// Stop dispatching after this many requests
    pub max_requests: Option<usize>,
    /// Stop dispatching after this much wall-clock time
    pub timeout: Option<Duration>,
    /// Per-request timeout handed to the renderer
    pub request_timeout: Duration,
    /// Extra start URLs besides the base URL
    pub seeds: Vec<String>,
}

impl SiteConfig {
    /// Config with default limits for `base_url`.
    pub fn new(base_url: &str, toc_selector: &str) -> Result<Self, ConfigError> {
        let scope = SiteScope::new(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            scope,
            toc_selector: toc_selector.to_string(),
            link_selector: DEFAULT_LINK_SELECTOR.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            max_requests: None,
            timeout: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            seeds: Vec::new(),
        })
    }

    /// Resolves command-line arguments into a config.
    ///
    /// Explicit arguments win over the preset's values.
    pub fn from_args(args: &CrawlArgs) -> Result<Self, ConfigError> {
        let base_url = args
            .base_url
            .as_deref()
            .or(args.preset.map(Preset::base_url))
            .ok_or(ConfigError::MissingBaseUrl)?;

        let toc_selector = args
            .toc_selector
            .as_deref()
            .or(args.preset.map(Preset::toc_selector))
            .unwrap_or(DEFAULT_TOC_SELECTOR);

        let mut config = Self::new(base_url, toc_selector)?;
        if let Some(link_selector) = &args.link_selector {
            config.link_selector = link_selector.clone();
        }
        config.concurrency = args.concurrency;
        config.max_requests = args.max_requests;
        config.timeout = args.timeout.map(Duration::from_secs);
        config.request_timeout = Duration::from_secs(args.request_timeout);
        config.seeds = args.seeds.clone();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn crawl_args(argv: &[&str]) -> CrawlArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Crawl(args) => args,
            other => panic!("expected crawl command, got {other:?}"),
        }
    }

    #[test]
    fn test_preset_fills_base_url_and_selector() {
        let args = crawl_args(&["toc-crawler", "crawl", "--preset", "guardrails"]);
        let config = SiteConfig::from_args(&args).unwrap();

        assert_eq!(config.scope.root().as_str(), "https://turbot.com/guardrails/docs");
        assert_eq!(config.toc_selector, "div.hidden a");
        assert_eq!(config.link_selector, DEFAULT_LINK_SELECTOR);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_explicit_arguments_override_preset() {
        let args = crawl_args(&[
            "toc-crawler",
            "crawl",
            "https://docs.example.com/guide/",
            "--preset",
            "steampipe",
            "--toc-selector",
            "aside a",
            "--link-selector",
            "main a[href]",
            "--concurrency",
            "2",
            "--max-requests",
            "50",
            "--seed",
            "https://docs.example.com/guide/orphan",
        ]);
        let config = SiteConfig::from_args(&args).unwrap();

        assert_eq!(config.scope.root().as_str(), "https://docs.example.com/guide");
        assert_eq!(config.toc_selector, "aside a");
        assert_eq!(config.link_selector, "main a[href]");
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.max_requests, Some(50));
        assert_eq!(config.seeds, vec!["https://docs.example.com/guide/orphan"]);
    }

    #[test]
    fn test_missing_base_url() {
        let args = crawl_args(&["toc-crawler", "crawl"]);
        let err = SiteConfig::from_args(&args).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = SiteConfig::new("not a url", "nav a").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let args = crawl_args(&["toc-crawler", "crawl", "https://site/docs", "--concurrency", "0"]);
        let err = SiteConfig::from_args(&args).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_preset_display_matches_cli_name() {
        for preset in Preset::value_variants() {
            let parsed = Preset::from_str(&preset.to_string(), false).unwrap();
            assert_eq!(parsed, *preset);
        }
    }
}
