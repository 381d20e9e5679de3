//! The RSS 2.0 feed serializer.
//!
//! The document shape is fixed: one `<item>` per visible article with a
//! title, a link, a guid equal to the link, an RFC-2822 publication
//! timestamp, and a CDATA-wrapped description. Text nodes outside CDATA
//! go through [`crate::xml::escape`]. The query layer hands this module
//! plain data; nothing here filters or re-sorts.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime};

use crate::article::Article;
use crate::description::article_description;
use crate::path::article_path;
use crate::xml::escape;

/// Bundled channel-level configuration for the feed.
pub struct FeedContext<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// The site origin with no trailing slash, e.g.
    /// `https://example.org`.
    pub site_url: &'a str,
    /// The normalized base prefix (empty or `/prefix`).
    pub base: &'a str,
    pub lang: &'a str,
}

/// Renders the feed document for `articles`, which must already be the
/// date-sorted visible list.
pub fn feed(context: &FeedContext, articles: &[Arc<Article>]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\">\n");
    xml.push_str("  <channel>\n");
    xml.push_str(&format!("    <title>{}</title>\n", escape(context.title)));
    xml.push_str(&format!(
        "    <link>{}{}/</link>\n",
        context.site_url, context.base
    ));
    xml.push_str(&format!(
        "    <description>{}</description>\n",
        escape(context.description)
    ));
    xml.push_str(&format!(
        "    <language>{}</language>\n",
        escape(context.lang)
    ));

    for article in articles {
        let link = format!(
            "{}{}",
            context.site_url,
            article_path(context.base, article.slug())
        );
        xml.push_str("    <item>\n");
        xml.push_str(&format!(
            "      <title>{}</title>\n",
            escape(&article.title)
        ));
        xml.push_str(&format!("      <link>{}</link>\n", link));
        xml.push_str(&format!("      <guid>{}</guid>\n", link));
        xml.push_str(&format!("      <pubDate>{}</pubDate>\n", pub_date(article)));
        xml.push_str(&format!(
            "      <description><![CDATA[{}]]></description>\n",
            article_description(article)
        ));
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");
    xml
}

/// Creates the feed document and writes it to a [`Write`].
pub fn write_feed<W: Write>(
    context: &FeedContext,
    articles: &[Arc<Article>],
    mut w: W,
) -> io::Result<()> {
    w.write_all(feed(context, articles).as_bytes())
}

/// The RFC-2822 publication timestamp: the publication date at midnight
/// UTC.
fn pub_date(article: &Article) -> String {
    NaiveDateTime::new(article.published, NaiveTime::MIN)
        .and_utc()
        .to_rfc2822()
}
