// src/page/html.rs
// =============================================================================
// Default PageExtractor: pulls TOC hrefs and body links out of HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// Two selectors drive extraction:
// - toc_selector:  anchors of the navigation sidebar (e.g. "div.mt-2 a")
// - link_selector: every other link worth following (e.g. "a[href]")
//
// Anchors matched by the TOC selector never show up as body links, so a
// sidebar entry is always credited to the TOC and not to the page.
//
// Hrefs are returned exactly as written in the page. Resolving them against
// the landed URL is the normalizer's job.
// =============================================================================

use std::collections::HashSet;

use scraper::{Html, Selector};

use super::{LinkDetail, PageExtractor, RenderedPage};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    toc: Selector,
    links: Selector,
}

impl SelectorExtractor {
    // Parses both selectors up front so a typo fails before the crawl starts
    pub fn new(toc_selector: &str, link_selector: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            toc: parse_selector(toc_selector)?,
            links: parse_selector(link_selector)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl PageExtractor for SelectorExtractor {
    fn extract_toc(&self, page: &RenderedPage) -> Vec<String> {
        let document = Html::parse_document(&page.body);

        document
            .select(&self.toc)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn extract_links(&self, page: &RenderedPage) -> Vec<LinkDetail> {
        let document = Html::parse_document(&page.body);

        // Node ids of every TOC anchor, so we can skip them below
        let toc_ids: HashSet<_> = document.select(&self.toc).map(|e| e.id()).collect();

        document
            .select(&self.links)
            .filter(|element| !toc_ids.contains(&element.id()))
            .filter_map(|element| {
                let href = element.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }
                Some(LinkDetail {
                    href: href.to_string(),
                    text: element.text().collect::<String>().trim().to_string(),
                })
            })
            .collect()
    }
}
