//! RuTracker topic pages.

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::provider::{
    Provider, element_text, last_href_with_prefix, select_text, select_text_in, selector,
};
use crate::date::parse_localized_date;
use crate::metadata::now;

/// Default base URL.
pub const RUTRACKER_BASE_URL: &str = "https://rutracker.org/forum";

const EDITED_PREFIX: &str = "ред. ";

/// Provider for `rutracker.org`.
#[derive(Debug, Clone)]
pub struct RutrackerProvider {
    base_url: String,
}

impl Default for RutrackerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RutrackerProvider {
    /// Creates a provider for the public site.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(RUTRACKER_BASE_URL)
    }

    /// Creates a provider claiming a different base URL (mirrors, tests).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Title block of the first post: the span right before the first `<hr>`.
    fn post_title(page: &Html) -> String {
        let Some(rule) = selector("div.post_body > span + hr") else {
            return String::new();
        };
        page.select(&rule)
            .next()
            .and_then(|hr| hr.prev_siblings().find_map(ElementRef::wrap))
            .map(|span| select_text_in(span, "span.post-b"))
            .unwrap_or_default()
    }

    /// Text of the `posted_since` label in the first post's body.
    fn edited_label(page: &Html) -> Option<String> {
        let bodies = selector("table#topic_main > tbody[id]")?;
        let label = selector("p.post-time > span.posted_since")?;
        let first = page.select(&bodies).next()?;
        first.select(&label).next().map(element_text)
    }
}

/// Extracts `28-Дек-23 15:41` from `(ред. 28-Дек-23 15:41)`.
fn edited_date(label: &str) -> Option<&str> {
    let pos = label.find(EDITED_PREFIX)?;
    let value = label[pos + EDITED_PREFIX.len()..].trim();
    let value = value.strip_suffix(')').unwrap_or(value).trim();
    (!value.is_empty()).then_some(value)
}

impl Provider for RutrackerProvider {
    fn name(&self) -> &'static str {
        "rutracker"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn magnet_link(&self, page: &Html) -> String {
        if let Some(sel) = selector("a.magnet-link")
            && let Some(href) = page.select(&sel).find_map(|a| a.value().attr("href"))
        {
            return href.to_string();
        }
        debug!(provider = self.name(), "no a.magnet-link, scanning all links");
        last_href_with_prefix(page, "a", "magnet:").unwrap_or_default()
    }

    fn title(&self, page: &Html) -> String {
        let title = Self::post_title(page);
        if title.is_empty() {
            select_text(page, "#topic-title")
        } else {
            title
        }
    }

    fn last_updated(&self, page: &Html) -> NaiveDateTime {
        let label = Self::edited_label(page).unwrap_or_default();
        let Some(raw) = edited_date(&label) else {
            warn!(provider = self.name(), "edited date not found");
            return now();
        };

        parse_localized_date(raw).unwrap_or_else(|error| {
            warn!(provider = self.name(), raw, error = %error, "failed to parse edited date");
            now()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    const TOPIC: &str = r#"
        <h1 class="maintitle"><a id="topic-title" href="viewtopic.php?t=6543210">Header Title</a></h1>
        <table id="topic_main">
          <tbody class="row1"><tr><td>ignored</td></tr></tbody>
          <tbody id="post_1">
            <tr><td>
              <p class="post-time"><span class="posted_since">(ред. 05-Мар-24 09:07)</span></p>
              <div class="post_body">
                <span style="font-size: 24px;"><span class="post-b">Show / Шоу (2024) S01</span></span>
                <hr class="post-hr">
                <a class="magnet-link" href="magnet:?xt=urn:btih:primary">magnet</a>
              </div>
            </td></tr>
          </tbody>
          <tbody id="post_2">
            <tr><td><p class="post-time"><span class="posted_since">(ред. 01-Янв-20 00:00)</span></p></td></tr>
          </tbody>
        </table>
        <a href="magnet:?xt=urn:btih:other">other</a>"#;

    #[test]
    fn test_edited_date_strips_decoration() {
        assert_eq!(edited_date("(ред. 05-Мар-24 09:07)"), Some("05-Мар-24 09:07"));
        assert_eq!(edited_date("ред. 28 Дек 2023 15:41:22"), Some("28 Дек 2023 15:41:22"));
        assert_eq!(edited_date("05-Мар-24 09:07"), None);
        assert_eq!(edited_date("(ред. )"), None);
    }

    #[test]
    fn test_last_updated_uses_first_post_body() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 0)
            .unwrap();
        assert_eq!(RutrackerProvider::new().last_updated(&page(TOPIC)), expected);
    }

    #[test]
    fn test_last_updated_without_label_falls_back_to_now() {
        let before = now();
        assert!(RutrackerProvider::new().last_updated(&page("<p>no edits</p>")) >= before);
    }

    #[test]
    fn test_magnet_prefers_magnet_link_class() {
        assert_eq!(
            RutrackerProvider::new().magnet_link(&page(TOPIC)),
            "magnet:?xt=urn:btih:primary"
        );
    }

    #[test]
    fn test_magnet_falls_back_to_generic_scan() {
        let html = page(
            r#"<a href="magnet:?xt=urn:btih:a">a</a><a href="magnet:?xt=urn:btih:b">b</a>"#,
        );
        assert_eq!(RutrackerProvider::new().magnet_link(&html), "magnet:?xt=urn:btih:b");
    }

    #[test]
    fn test_title_from_span_before_rule() {
        assert_eq!(
            RutrackerProvider::new().title(&page(TOPIC)),
            "Show / Шоу (2024) S01"
        );
    }

    #[test]
    fn test_title_falls_back_to_topic_title() {
        let html = page(r#"<h1><a id="topic-title">Only Header</a></h1>"#);
        assert_eq!(RutrackerProvider::new().title(&html), "Only Header");
    }

    #[test]
    fn test_no_comment_feed() {
        assert!(RutrackerProvider::new().comment_feed_url(&page(TOPIC)).is_none());
    }
}
