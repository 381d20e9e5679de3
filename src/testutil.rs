//! Shared fixtures for the unit tests.

use chrono::NaiveDate;

use crate::article::Article;

/// A minimal published article: universal language, no tags, not pinned,
/// not a draft. Tests adjust individual fields as needed.
pub fn article(id: &str, published: &str) -> Article {
    Article {
        id: id.to_owned(),
        lang: String::new(),
        title: id.to_owned(),
        description: String::new(),
        published: published.parse::<NaiveDate>().unwrap(),
        update: None,
        tags: Vec::new(),
        draft: false,
        pin: 0,
        abbrlink: String::new(),
        toc: true,
        body: String::from("<p>body text</p>"),
        minutes: None,
    }
}
