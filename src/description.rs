//! Derives the description text used for feed items: the author's
//! frontmatter description when present, otherwise an excerpt of the
//! rendered body.

use crate::article::Article;

/// Upper bound, in characters, for derived excerpts.
const EXCERPT_LENGTH: usize = 200;

/// The description for an article. Falls back from the frontmatter
/// description to a body excerpt; never empty unless the body is.
pub fn article_description(article: &Article) -> String {
    if !article.description.is_empty() {
        return article.description.clone();
    }
    excerpt(&plain_text(&article.body), EXCERPT_LENGTH)
}

/// Strips markup from a rendered HTML body, returning the visible text
/// with whitespace runs collapsed.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let mut collapsed = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }
    collapsed
}

/// Truncates `text` to at most `limit` characters, breaking at a word
/// boundary and appending an ellipsis when anything was cut.
fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }
    let cut: String = text.chars().take(limit).collect();
    let kept = match cut.rfind(' ') {
        Some(boundary) => &cut[..boundary],
        None => &cut[..],
    };
    format!("{}…", kept.trim_end())
}
