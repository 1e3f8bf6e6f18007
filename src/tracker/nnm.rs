//! NNM-Club topic pages.

use chrono::NaiveDateTime;
use scraper::Html;
use tracing::warn;

use super::feed::{FeedItem, latest_item};
use super::provider::{Provider, last_href_with_prefix, select_text, select_text_in, selector};
use crate::date::parse_localized_date;
use crate::metadata::now;

/// Default base URL.
pub const NNM_BASE_URL: &str = "https://nnmclub.to/forum";

const TITLE_SELECTORS: [&str; 2] = [
    "a.maintitle",
    "div.postbody span[style='font-size: 20px; line-height: normal'] span[style='font-weight: bold']",
];

const REGISTERED_LABEL: &str = "Зарегистрирован:";

/// Provider for `nnmclub.to`.
#[derive(Debug, Clone)]
pub struct NnmProvider {
    base_url: String,
}

impl Default for NnmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NnmProvider {
    /// Creates a provider for the public site.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(NNM_BASE_URL)
    }

    /// Creates a provider claiming a different base URL (mirrors, tests).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Provider for NnmProvider {
    fn name(&self) -> &'static str {
        "nnm"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn title(&self, page: &Html) -> String {
        TITLE_SELECTORS
            .iter()
            .map(|css| select_text(page, css))
            .find(|title| !title.is_empty())
            .unwrap_or_default()
    }

    fn last_updated(&self, page: &Html) -> NaiveDateTime {
        let (Some(rows), Some(cells)) = (selector("tr.row1"), selector("td.genmed")) else {
            return now();
        };

        // the last labelled row wins when the page repeats it
        let raw = page
            .select(&rows)
            .filter(|row| {
                row.select(&cells).next().is_some_and(|label| {
                    label.text().collect::<String>().contains(REGISTERED_LABEL)
                })
            })
            .filter_map(|row| row.select(&cells).last())
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .last();

        let Some(raw) = raw else {
            warn!(provider = self.name(), "registration date not found");
            return now();
        };

        parse_localized_date(&raw).unwrap_or_else(|error| {
            warn!(
                provider = self.name(),
                raw = %raw,
                error = %error,
                "failed to parse registration date"
            );
            now()
        })
    }

    fn comment_feed_url(&self, page: &Html) -> Option<String> {
        let Some(href) = last_href_with_prefix(page, "td a", "rss.php") else {
            warn!(provider = self.name(), "rss link not found");
            return None;
        };
        Some(format!("{}/{href}", self.base_url))
    }

    fn comment_from_feed(&self, items: &[FeedItem]) -> String {
        let Some(item) = latest_item(items) else {
            return String::new();
        };
        let fragment = Html::parse_fragment(&item.description);
        let root = fragment.root_element();
        select_text_in(root, "span.postbody")
    }
}
