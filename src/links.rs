//! Link extraction: saved table of contents → ordered chapter URL list.
//!
//! Anchors matching the configured selector are resolved against the base
//! URL and kept when their path starts with the configured prefix. Order
//! follows the document and duplicates are kept, so the list mirrors the
//! table of contents exactly.

use crate::config::LinkConfig;
use crate::error::Web2MdError;
use crate::output::LinkOutput;
use crate::pipeline::parse::compile_selector;
use crate::pipeline::write;
use reqwest::Url;
use scraper::Html;
use std::path::Path;
use tracing::{debug, info};

/// Links found in `html`, plus how many matched anchors were rejected.
pub fn extract_links(html: &str, config: &LinkConfig) -> Result<(Vec<String>, usize), Web2MdError> {
    let base = Url::parse(&config.base_url).map_err(|e| Web2MdError::InvalidUrl {
        input: config.base_url.clone(),
        reason: e.to_string(),
    })?;
    let selector = compile_selector(&config.selector)?;
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    let mut rejected = 0;
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
        else {
            rejected += 1;
            continue;
        };
        match base.join(href) {
            Ok(url) if matches_prefix(&url, config.path_prefix.as_deref()) => {
                links.push(url.to_string());
            }
            _ => {
                debug!("Rejected link: {}", href);
                rejected += 1;
            }
        }
    }
    Ok((links, rejected))
}

fn matches_prefix(url: &Url, prefix: Option<&str>) -> bool {
    match prefix {
        None => true,
        Some(p) => url.path().starts_with(p),
    }
}

/// Parse a link-list file body: one URL per line, blank lines ignored.
pub fn parse_link_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse the link list written by [`extract_links_to_file`].
pub async fn read_link_list(path: &Path) -> Result<Vec<String>, Web2MdError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Web2MdError::from_read(path, e))?;
    Ok(parse_link_list(&text))
}

/// Read `config.input`, extract the chapter links and save them
/// newline-joined to `config.output`.
pub async fn extract_links_to_file(config: &LinkConfig) -> Result<LinkOutput, Web2MdError> {
    let html = tokio::fs::read_to_string(&config.input)
        .await
        .map_err(|e| Web2MdError::from_read(&config.input, e))?;

    let (links, rejected) = extract_links(&html, config)?;
    for link in &links {
        info!("{}", link);
    }

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        write::ensure_dir(parent).await?;
    }
    write::write_atomic(&config.output, links.join("\n")).await?;
    info!("Saved {} links to {}", links.len(), config.output.display());

    Ok(LinkOutput {
        links,
        rejected,
        path: config.output.clone(),
    })
}
