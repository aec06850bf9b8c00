//! Extraction rules for the sous-titres.eu search results page.
//!
//! Each rule looks at one part of the markup and returns `None` when the
//! expected element is absent, leaving the decision of what that means to
//! the caller.

use super::SearchError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

/// Compiled selectors for the search results markup
pub(super) struct ResultSelectors {
    heading: Selector,
    candidate: Selector,
    serie_title: Selector,
    film_title: Selector,
    image: Selector,
}

impl ResultSelectors {
    pub fn new() -> Result<Self, SearchError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SearchError::Selector(format!("{css}: {e}")))
        };

        Ok(Self {
            heading: parse("h3")?,
            candidate: parse("a.subList")?,
            serie_title: parse("span.smallFilenameSerie")?,
            film_title: parse("span.smallFilenameFilm")?,
            image: parse("img")?,
        })
    }
}

/// Finds the result containers for a show or movie name
///
/// Every `h3` heading whose text contains `name` (case-insensitive) marks its
/// parent element as a container. Returns `None` when the page has no `h3`
/// at all, which means the page layout is not the one we know.
pub(super) fn result_containers<'a>(
    document: &'a Html,
    selectors: &ResultSelectors,
    name: &str,
) -> Option<Vec<ElementRef<'a>>> {
    let headings: Vec<ElementRef<'a>> = document.select(&selectors.heading).collect();
    if headings.is_empty() {
        return None;
    }

    let name = name.to_lowercase();
    let mut seen = HashSet::new();
    let mut containers = Vec::new();

    for heading in headings {
        let text = element_text(&heading);
        debug!("Heading {}", text);

        if !text.to_lowercase().contains(&name) {
            continue;
        }

        let Some(parent) = heading.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        // Two matching headings under one parent must not list its entries twice
        if seen.insert(parent.id()) {
            containers.push(parent);
        }
    }

    Some(containers)
}

/// Subtitle entries inside a result container
pub(super) fn candidates<'a>(
    container: ElementRef<'a>,
    selectors: &'a ResultSelectors,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    container.select(&selectors.candidate)
}

/// Release title of a candidate
///
/// Series entries label their file name with `smallFilenameSerie`, movies
/// with `smallFilenameFilm`.
pub(super) fn result_title(candidate: &ElementRef, selectors: &ResultSelectors) -> Option<String> {
    candidate
        .select(&selectors.serie_title)
        .next()
        .or_else(|| candidate.select(&selectors.film_title).next())
        .map(|span| element_text(&span))
}

/// Absolute link to the result page, always `{base_url}/{href}`
pub(super) fn result_link(candidate: &ElementRef, base_url: &str) -> String {
    let href = candidate.value().attr("href").unwrap_or_default();
    format!("{}/{}", base_url, href)
}

/// Language code, taken from the `alt` of the first flag image
pub(super) fn result_language(
    candidate: &ElementRef,
    selectors: &ResultSelectors,
) -> Option<String> {
    candidate
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .map(str::to_string)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
