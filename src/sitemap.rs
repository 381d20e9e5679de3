//! The sitemap serializer: enumerates every canonical URL the site
//! serves and emits the `<urlset>` document.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};

use crate::path::{article_path, page_count, page_path, tag_path};
use crate::query::Queries;
use crate::store::RenderError;
use crate::xml::escape;

/// Bundled configuration for sitemap generation.
pub struct SitemapContext<'a> {
    /// The site origin with no trailing slash.
    pub site_url: &'a str,
    /// The normalized base prefix (empty or `/prefix`).
    pub base: &'a str,
    /// Articles per listing page.
    pub page_size: usize,
}

/// Collects the sitemap's URL list: the fixed pages, every pagination
/// page of the regular listing, every pagination page of each tag's
/// listing, and every article's canonical URL. Duplicates are dropped,
/// keeping the first occurrence (the site root and page 1 of the root
/// listing are the same URL).
pub fn urls(
    context: &SitemapContext,
    queries: &Queries,
) -> std::result::Result<Vec<String>, RenderError> {
    let articles = queries.articles()?;
    let regular = queries.regular_articles()?;
    let tags = queries.all_tags()?;

    let join = |path: String| format!("{}{}", context.site_url, path);

    let mut urls = vec![
        join(format!("{}/", context.base)),
        join(format!("{}/about/", context.base)),
        join(format!("{}/tags/", context.base)),
        join(format!("{}/search/", context.base)),
        join(format!("{}/rss.xml", context.base)),
    ];

    for page in 1..=page_count(regular.len(), context.page_size) {
        urls.push(join(page_path(context.base, page, "/")));
    }

    for tag in &tags {
        let tagged = queries.articles_by_tag(tag)?;
        for page in 1..=page_count(tagged.len(), context.page_size) {
            urls.push(join(page_path(context.base, page, &tag_path("", tag))));
        }
    }

    for article in &articles {
        urls.push(join(article_path(context.base, article.slug())));
    }

    let mut seen = HashSet::new();
    urls.retain(|url| seen.insert(url.clone()));
    Ok(urls)
}

/// Renders the sitemap document.
pub fn sitemap(
    context: &SitemapContext,
    queries: &Queries,
) -> std::result::Result<String, RenderError> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for url in urls(context, queries)? {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n  </url>\n",
            escape(&url)
        ));
    }
    xml.push_str("</urlset>\n");
    Ok(xml)
}

/// Creates the sitemap document and writes it to a [`Write`].
pub fn write_sitemap<W: Write>(
    context: &SitemapContext,
    queries: &Queries,
    mut w: W,
) -> Result<()> {
    w.write_all(sitemap(context, queries)?.as_bytes())?;
    Ok(())
}

/// The result of a sitemap-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error producing or writing the sitemap.
#[derive(Debug)]
pub enum Error {
    /// Returned when deriving the article views fails.
    Render(RenderError),

    /// Returned when writing the document fails.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<RenderError> for Error {
    /// Converts a [`RenderError`] into an [`Error`]. It allows us to use
    /// the `?` operator when deriving the sitemap's views.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when writing the document.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
