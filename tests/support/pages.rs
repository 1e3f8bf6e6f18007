//! Minimal tracker pages carrying just what the providers read.

/// A RuTracker topic with an edit label like `05-Мар-24 09:07`.
#[must_use]
pub fn rutracker_topic(title: &str, edited: &str, magnet: &str) -> String {
    format!(
        r#"<html><head><title>{title} :: RuTracker.org</title></head><body>
<h1 class="maintitle"><a id="topic-title" href="viewtopic.php?t=1">{title}</a></h1>
<table id="topic_main">
  <tbody id="post_1"><tr><td>
    <p class="post-time"><span class="posted_since">(ред. {edited})</span></p>
    <div class="post_body">
      <span style="font-size: 24px;"><span class="post-b">{title}</span></span>
      <hr class="post-hr">
      <a class="magnet-link" href="{magnet}">magnet</a>
    </div>
  </td></tr></tbody>
</table>
</body></html>"#
    )
}

/// An NNM-Club topic registered at `registered` with a comment feed link.
#[must_use]
pub fn nnm_topic(title: &str, registered: &str, magnet: &str, feed_href: &str) -> String {
    format!(
        r#"<html><body>
<a class="maintitle" href="viewtopic.php?t=1">{title}</a>
<table>
  <tr class="row1"><td class="genmed">&nbsp;Зарегистрирован:&nbsp;</td><td class="genmed">{registered}</td></tr>
</table>
<table><tr><td><a href="{magnet}">magnet</a></td><td><a href="{feed_href}">RSS</a></td></tr></table>
</body></html>"#
    )
}

/// An RSS feed whose items are `(description, pubDate)` pairs.
#[must_use]
pub fn comment_feed(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(description, published)| {
            format!(
                "<item><description><![CDATA[{description}]]></description><pubDate>{published}</pubDate></item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>comments</title>{items}</channel></rss>"#)
}
