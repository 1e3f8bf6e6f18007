//! Minimal RSS reader for tracker comment feeds.

use chrono::{DateTime, NaiveDateTime};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

/// One `<item>` of a comment feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    /// Item title.
    pub title: String,
    /// Raw description, usually an HTML fragment.
    pub description: String,
    /// Publish time converted to local naive time; `None` if absent or unparseable.
    pub published: Option<NaiveDateTime>,
}

/// Parses RSS XML into items. Malformed XML yields the items read so far.
#[must_use]
pub fn parse_feed(content: &str) -> Vec<FeedItem> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current_tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if current_tag == "item" {
                    current = Some(FeedItem::default());
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item"
                    && let Some(item) = current.take()
                {
                    items.push(item);
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default().to_string();
                    assign(item, &current_tag, text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    assign(item, &current_tag, text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed feed XML, keeping items read so far");
                break;
            }
            _ => {}
        }
    }

    debug!(count = items.len(), "feed parsed");
    items
}

fn assign(item: &mut FeedItem, tag: &str, text: String) {
    match tag {
        "title" => item.title.push_str(&text),
        "description" => item.description.push_str(&text),
        "pubDate" => item.published = parse_pub_date(&text),
        _ => {}
    }
}

/// Parses an RFC 2822 `pubDate` into local naive time.
#[must_use]
pub fn parse_pub_date(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Local).naive_local())
}

/// Returns the item with the latest publish time; the first one wins ties.
///
/// Items without a publish time only win when no item has one.
#[must_use]
pub fn latest_item(items: &[FeedItem]) -> Option<&FeedItem> {
    items.iter().fold(None, |best: Option<&FeedItem>, item| match best {
        Some(current) if item.published <= current.published => Some(current),
        _ => Some(item),
    })
}
