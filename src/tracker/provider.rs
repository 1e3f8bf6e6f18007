//! Per-site extraction strategy.
//!
//! A [`Provider`] turns a parsed tracker page into the fields of a
//! [`FileMetadata`](crate::FileMetadata). Every extraction is best effort:
//! a miss is logged with `warn!` and yields an empty value (or, for the
//! update time, the current time) instead of an error.
//!
//! Comment extraction is split in two so the page tree never lives across
//! an await point: [`Provider::comment_feed_url`] reads the feed link from
//! the page, the parser fetches the feed, and [`Provider::comment_from_feed`]
//! picks the comment out of the feed items.

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use super::feed::{FeedItem, latest_item};

/// Query parameter carrying the topic id on supported trackers.
pub const TOPIC_PARAM: &str = "t";

/// Capability set every tracker variant implements.
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// URL prefix this provider claims.
    fn base_url(&self) -> &str;

    /// Returns the last `magnet:` link on the page, or an empty string.
    fn magnet_link(&self, page: &Html) -> String {
        last_href_with_prefix(page, "a", "magnet:").unwrap_or_default()
    }

    /// Returns the release title, or an empty string.
    fn title(&self, page: &Html) -> String;

    /// Extracts the topic id from the page URL; empty on malformed URLs.
    fn topic_id(&self, source_url: &str) -> String {
        query_param(self.name(), source_url, TOPIC_PARAM)
    }

    /// Returns the edit/registration time printed on the page.
    ///
    /// Falls back to the current time when the label is missing or unparseable.
    fn last_updated(&self, page: &Html) -> NaiveDateTime;

    /// Absolute URL of the comment feed, if the site has one.
    fn comment_feed_url(&self, _page: &Html) -> Option<String> {
        None
    }

    /// Picks the comment text out of feed items.
    ///
    /// The default returns the trimmed description of the latest item.
    fn comment_from_feed(&self, items: &[FeedItem]) -> String {
        latest_item(items)
            .map(|item| item.description.trim().to_string())
            .unwrap_or_default()
    }
}

/// Reads a query parameter, logging and returning empty on a malformed URL.
pub(crate) fn query_param(provider: &str, source_url: &str, name: &str) -> String {
    match Url::parse(source_url) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default(),
        Err(error) => {
            warn!(provider, url = source_url, error = %error, "failed to parse tracker url");
            String::new()
        }
    }
}

/// Parses a CSS selector, logging instead of panicking on bad input.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(error) => {
            warn!(css, error = %error, "invalid selector");
            None
        }
    }
}

/// Concatenated, trimmed text of every element matching `css` in `page`.
pub(crate) fn select_text(page: &Html, css: &str) -> String {
    let Some(sel) = selector(css) else {
        return String::new();
    };
    page.select(&sel)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Concatenated, trimmed text of every descendant of `scope` matching `css`.
pub(crate) fn select_text_in(scope: ElementRef<'_>, css: &str) -> String {
    let Some(sel) = selector(css) else {
        return String::new();
    };
    scope
        .select(&sel)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Trimmed text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// `href` of the last element matching `css` whose target starts with `prefix`.
pub(crate) fn last_href_with_prefix(page: &Html, css: &str, prefix: &str) -> Option<String> {
    let sel = selector(css)?;
    page.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| href.starts_with(prefix))
        .last()
        .map(str::to_string)
}
