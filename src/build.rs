//! Exports the [`build_site`] function which stitches together the
//! high-level steps of a build: loading the articles ([`crate::store`]),
//! deriving the listing views ([`crate::query`]), reporting slug
//! collisions, and writing the feed and sitemap documents
//! ([`crate::feed`], [`crate::sitemap`]).

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::config::Config;
use crate::feed::{write_feed, FeedContext};
use crate::query::{Mode, Queries};
use crate::sitemap::{write_sitemap, Error as SitemapError, SitemapContext};
use crate::store::{Error as LoadError, Loader, ReadingTime, RenderError};

/// Per-invocation options, as opposed to the per-project [`Config`].
pub struct BuildOptions {
    /// Where the generated documents land.
    pub output_directory: PathBuf,

    /// Preview builds include drafts.
    pub drafts: bool,

    /// Worker count for loading and rendering.
    pub threads: usize,
}

/// Builds the site outputs from a [`Config`] object. Duplicate slugs are
/// reported as warnings rather than failing the build; wire the logger
/// up accordingly if CI should treat them as fatal.
pub fn build_site(config: &Config, options: &BuildOptions) -> Result<()> {
    let loader = Loader::new(&config.articles_directory, config.toc);
    let articles = loader.load(options.threads)?;
    info!(
        "loaded {} articles from `{}`",
        articles.len(),
        config.articles_directory.display()
    );

    let mode = if options.drafts {
        Mode::Preview
    } else {
        Mode::Production
    };
    let queries = Queries::new(
        articles,
        Arc::new(ReadingTime::default()),
        mode,
        config.lang.clone(),
        options.threads,
    );

    for message in queries.duplicate_slugs() {
        warn!("{}", message);
    }

    create_dir_all(&options.output_directory)?;
    let site_url = config.site_url_prefix();

    let feed_path = options.output_directory.join("rss.xml");
    write_feed(
        &FeedContext {
            title: &config.title,
            description: &config.description,
            site_url: &site_url,
            base: &config.base,
            lang: &config.lang,
        },
        &queries.articles()?,
        File::create(&feed_path)?,
    )?;
    info!("wrote `{}`", feed_path.display());

    let sitemap_path = options.output_directory.join("sitemap.xml");
    write_sitemap(
        &SitemapContext {
            site_url: &site_url,
            base: &config.base,
            page_size: config.page_size,
        },
        &queries,
        File::create(&sitemap_path)?,
    )?;
    info!("wrote `{}`", sitemap_path.display());

    Ok(())
}

/// The result of a site build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading articles.
    Load(LoadError),

    /// Returned when deriving the listing views fails.
    Render(RenderError),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<LoadError> for Error {
    /// Converts load errors into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: LoadError) -> Error {
        Error::Load(err)
    }
}

impl From<RenderError> for Error {
    /// Converts render errors into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<io::Error> for Error {
    /// Converts [`io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<SitemapError> for Error {
    /// Converts sitemap errors into [`Error`] by collapsing them into
    /// the matching variant.
    fn from(err: SitemapError) -> Error {
        match err {
            SitemapError::Render(e) => Error::Render(e),
            SitemapError::Io(e) => Error::Io(e),
        }
    }
}
