//! Builders for the site's root-relative paths.
//!
//! Every builder takes the resolved base prefix as an ordinary argument.
//! [`crate::config::Config::base`] is already normalized to either the
//! empty string or `/prefix` with no trailing slash, so the builders can
//! glue it straight onto the front of the path.

/// The path of a tag's first listing page.
pub fn tag_path(base: &str, tag: &str) -> String {
    format!("{}/tags/{}/", base, tag)
}

/// The canonical path of an article.
pub fn article_path(base: &str, slug: &str) -> String {
    format!("{}/articles/{}/", base, slug)
}

/// The path for page `page` of a paginated listing rooted at
/// `base_path`. Page 1 collapses to the bare listing root; later pages
/// append `page/{n}/`.
pub fn page_path(base: &str, page: usize, base_path: &str) -> String {
    let normalized = if base_path.ends_with('/') {
        base_path.to_owned()
    } else {
        format!("{}/", base_path)
    };
    if page <= 1 {
        format!("{}{}", base, normalized)
    } else {
        format!("{}{}page/{}/", base, normalized, page)
    }
}

/// The number of pages needed to list `len` items at `page_size` items
/// per page. Never zero: an empty listing still renders its first page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    std::cmp::max(1, (len + page_size - 1) / page_size)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tag_path() {
        assert_eq!("/tags/rust/", tag_path("", "rust"));
        assert_eq!("/blog/tags/rust/", tag_path("/blog", "rust"));
    }

    #[test]
    fn test_article_path() {
        assert_eq!("/articles/hello/", article_path("", "hello"));
        assert_eq!("/blog/articles/hello/", article_path("/blog", "hello"));
    }

    #[test]
    fn test_page_path_collapses_first_page() {
        assert_eq!("/", page_path("", 1, "/"));
        assert_eq!("/", page_path("", 0, "/"));
        assert_eq!("/blog/", page_path("/blog", 1, "/"));
    }

    #[test]
    fn test_page_path_later_pages() {
        assert_eq!("/page/2/", page_path("", 2, "/"));
        assert_eq!("/blog/page/3/", page_path("/blog", 3, "/"));
        assert_eq!("/tags/rust/page/2/", page_path("", 2, "/tags/rust/"));
    }

    #[test]
    fn test_page_path_normalizes_missing_trailing_slash() {
        assert_eq!("/tags/rust/page/2/", page_path("", 2, "/tags/rust"));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(1, page_count(0, 10));
        assert_eq!(1, page_count(10, 10));
        assert_eq!(2, page_count(11, 10));
        assert_eq!(3, page_count(25, 10));
    }
}
