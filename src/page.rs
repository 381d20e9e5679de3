//! Classifies request paths into the page types templates care about.
//! The base prefix is stripped before matching, so the helpers work the
//! same whether the site is served from the root or a sub-path.

/// Checks whether `path`, after stripping the base prefix and the
/// surrounding slashes, belongs to the page type named by `prefix`. The
/// empty prefix matches the home page only.
fn is_page_type(base: &str, path: &str, prefix: &str) -> bool {
    let without_base = if !base.is_empty() && path.starts_with(base) {
        &path[base.len()..]
    } else {
        path
    };
    let normalized = without_base.trim_matches('/');
    if prefix.is_empty() {
        normalized.is_empty()
    } else {
        normalized.starts_with(prefix)
    }
}

pub fn is_home_page(base: &str, path: &str) -> bool {
    is_page_type(base, path, "")
}

pub fn is_article_page(base: &str, path: &str) -> bool {
    is_page_type(base, path, "articles")
}

pub fn is_tag_page(base: &str, path: &str) -> bool {
    is_page_type(base, path, "tags")
}

pub fn is_about_page(base: &str, path: &str) -> bool {
    is_page_type(base, path, "about")
}

/// The page-type flags for one path, bundled for templates that branch
/// on more than one of them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageInfo {
    pub is_home: bool,
    pub is_article: bool,
    pub is_tag: bool,
    pub is_about: bool,
}

pub fn page_info(base: &str, path: &str) -> PageInfo {
    PageInfo {
        is_home: is_home_page(base, path),
        is_article: is_article_page(base, path),
        is_tag: is_tag_page(base, path),
        is_about: is_about_page(base, path),
    }
}
