//! Defines the [`Article`] type, the immutable record everything else in
//! the crate derives from.

use chrono::{Datelike, NaiveDate};

/// A single content entry. Articles are loaded once per build by the
/// store ([`crate::store`]) and never mutated afterwards; the query layer
/// ([`crate::query`]) only builds new containers referencing the same
/// records.
#[derive(Clone, Debug, PartialEq)]
pub struct Article {
    /// Stable identifier derived from the source file's path relative to
    /// the articles directory. Unique within the collection.
    pub id: String,

    /// Language partition. The empty string marks a universal article,
    /// visible in every locale.
    pub lang: String,

    /// The title of the article.
    pub title: String,

    /// Author-provided summary; empty when the frontmatter omits it.
    pub description: String,

    /// Publication date. Ordering throughout the crate is driven by this
    /// field alone.
    pub published: NaiveDate,

    /// Last-revision date, when the author recorded one.
    pub update: Option<NaiveDate>,

    /// Tags exactly as authored: order and duplicates preserved.
    pub tags: Vec<String>,

    /// Draft articles are excluded from production listings but visible
    /// in preview builds.
    pub draft: bool,

    /// Featured priority in `0..=99`. Zero means not pinned.
    pub pin: u8,

    /// Slug override (`[a-z0-9-]*`). Empty means fall back to `id`.
    pub abbrlink: String,

    /// Whether templates should render a table of contents for this
    /// article.
    pub toc: bool,

    /// The body, rendered to HTML.
    pub body: String,

    /// Reading-time estimate in minutes. `None` on raw records; the
    /// query layer attaches it to everything it returns.
    pub minutes: Option<f64>,
}

impl Article {
    /// The URL-path identifier for the article: the `abbrlink` override
    /// when the author wrote one, otherwise the article id.
    pub fn slug(&self) -> &str {
        if self.abbrlink.is_empty() {
            &self.id
        } else {
            &self.abbrlink
        }
    }

    /// The calendar year of the publication date.
    pub fn year(&self) -> i32 {
        self.published.year()
    }

    /// The calendar month of the publication date.
    pub fn month(&self) -> u32 {
        self.published.month()
    }

    /// The day-of-month of the publication date.
    pub fn day(&self) -> u32 {
        self.published.day()
    }
}
