//! Project configuration: locating and loading `haku.yaml`.
//!
//! The raw file mirrors the theme's configuration sections (`site`,
//! `global`, `content`); loading resolves it into a flat [`Config`] of
//! concrete values so nothing downstream re-derives a default. Color and
//! typography settings belong to the presentation layer and are not read
//! here.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

/// The project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "haku.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct SiteSection {
    title: String,

    #[serde(default)]
    subtitle: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: String,

    url: Url,

    #[serde(default = "default_base")]
    base: String,

    #[serde(default)]
    favicon: String,
}

fn default_base() -> String {
    String::from("/")
}

#[derive(Deserialize)]
#[serde(default)]
struct GlobalSection {
    lang: String,
    toc: bool,
    date_fmt: String,
}

impl Default for GlobalSection {
    fn default() -> Self {
        GlobalSection {
            lang: String::new(),
            toc: true,
            date_fmt: String::from("YYYY-MM-DD"),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ContentSection {
    page_size: PageSize,
}

#[derive(Deserialize)]
struct Project {
    site: SiteSection,

    #[serde(default)]
    global: GlobalSection,

    #[serde(default)]
    content: ContentSection,
}

/// Fully resolved project configuration.
pub struct Config {
    /// The directory containing the project file.
    pub root_directory: PathBuf,

    /// The directory article sources are loaded from.
    pub articles_directory: PathBuf,

    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub site_url: Url,

    /// Normalized base prefix: empty, or `/prefix` with no trailing
    /// slash.
    pub base: String,

    pub favicon: String,
    pub lang: String,

    /// Default `toc` for articles whose frontmatter doesn't set one.
    pub toc: bool,

    pub date_fmt: String,
    pub page_size: usize,
}

impl Config {
    /// Searches `dir` and its ancestors for the project file.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Loading configuration from `{}`", path.display()))?;

        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path `{}`",
                path.display()
            )
        })?;
        if project.content.page_size.0 == 0 {
            return Err(anyhow!("`content.page_size` must be at least 1"));
        }

        Ok(Config {
            root_directory: root.to_owned(),
            articles_directory: root.join("articles"),
            title: project.site.title,
            subtitle: project.site.subtitle,
            description: project.site.description,
            author: project.site.author,
            site_url: project.site.url,
            base: normalize_base(&project.site.base),
            favicon: project.site.favicon,
            lang: project.global.lang,
            toc: project.global.toc,
            date_fmt: project.global.date_fmt,
            page_size: project.content.page_size.0,
        })
    }

    /// The site origin as a prefix: `Url` always renders the root path
    /// with a trailing slash, which would double up against the
    /// root-relative paths the builders produce.
    pub fn site_url_prefix(&self) -> String {
        self.site_url.as_str().trim_end_matches('/').to_owned()
    }
}

/// `/` (or empty) means no prefix; any other value is anchored with a
/// leading slash and loses its trailing one, so it can be glued directly
/// onto root-relative paths.
fn normalize_base(base: &str) -> String {
    if base.is_empty() || base == "/" {
        return String::new();
    }
    let trimmed = base.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    const MINIMAL: &str = "site:\n  title: HAKU\n  url: https://example.org\n";

    #[test]
    fn test_minimal_project_file_defaults() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), MINIMAL).unwrap();

        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE))?;
        assert_eq!("HAKU", config.title);
        assert_eq!("", config.base);
        assert_eq!(10, config.page_size);
        assert!(config.toc);
        assert_eq!("https://example.org", config.site_url_prefix());
        assert_eq!(dir.path().join("articles"), config.articles_directory);
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), MINIMAL).unwrap();
        let nested = dir.path().join("articles").join("2024");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested)?;
        assert_eq!(dir.path(), config.root_directory);
        Ok(())
    }

    #[test]
    fn test_full_project_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            "site:\n  title: HAKU\n  subtitle: a theme\n  url: https://example.org\n  base: /blog/\n\
             global:\n  lang: zh\n  toc: false\n\
             content:\n  page_size: 5\n",
        )
        .unwrap();

        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE))?;
        assert_eq!("/blog", config.base);
        assert_eq!("zh", config.lang);
        assert!(!config.toc);
        assert_eq!(5, config.page_size);
        Ok(())
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            "site:\n  title: HAKU\n  url: https://example.org\ncontent:\n  page_size: 0\n",
        )
        .unwrap();

        assert!(Config::from_project_file(&dir.path().join(PROJECT_FILE)).is_err());
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!("", normalize_base("/"));
        assert_eq!("", normalize_base(""));
        assert_eq!("/blog", normalize_base("/blog"));
        assert_eq!("/blog", normalize_base("/blog/"));
        assert_eq!("/blog", normalize_base("blog"));
    }
}
