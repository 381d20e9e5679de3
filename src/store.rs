//! The content store: loads [`Article`] records from the file system and
//! defines the renderer seam that attaches reading-time metadata.
//!
//! Article sources live under the project's `articles/` directory, one
//! `.md` file per article (nested directories are fine; the relative
//! path becomes the article id). Each source must be structured as
//! follows:
//!
//! 1. Initial frontmatter fence (`---`)
//! 2. YAML frontmatter with at least `title` and `published`
//! 3. Terminal frontmatter fence (`---`)
//! 4. Article body in markdown
//!
//! For example:
//!
//! ```md
//! ---
//! title: Hello, world!
//! published: 2024-01-10
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Frontmatter is validated here, at load time: an out-of-range `pin` or
//! a malformed `abbrlink` fails the build with an error naming the
//! source file. Slug collisions are a softer anomaly and are left to the
//! query layer's detector.

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Deserializer};
use walkdir::WalkDir;

use crate::article::Article;
use crate::description::plain_text;

const MARKDOWN_EXTENSION: &str = "md";

/// Loads articles from a project's articles directory.
pub struct Loader<'a> {
    /// The directory to search for article sources.
    articles_directory: &'a Path,

    /// The `toc` value for articles whose frontmatter doesn't set one.
    default_toc: bool,
}

impl<'a> Loader<'a> {
    pub fn new(articles_directory: &'a Path, default_toc: bool) -> Loader<'a> {
        Loader {
            articles_directory,
            default_toc,
        }
    }

    /// Collects every article source under the articles directory and
    /// parses them, on a worker pool when `threads > 1`. The result is
    /// in canonical collection order (ascending id) no matter which
    /// worker finished first.
    pub fn load(&self, threads: usize) -> Result<Vec<Article>> {
        let sources = self.sources()?;
        let mut articles = if threads < 2 {
            sources
                .iter()
                .map(|source| self.parse_article(source))
                .collect::<Result<Vec<Article>>>()?
        } else {
            self.load_parallel(&sources, threads)?
        };
        articles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(articles)
    }

    fn sources(&self) -> Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for result in WalkDir::new(self.articles_directory) {
            let entry = result?;
            if entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map_or(false, |extension| extension == MARKDOWN_EXTENSION)
            {
                sources.push(entry.path().to_owned());
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn load_parallel(&self, sources: &[PathBuf], threads: usize) -> Result<Vec<Article>> {
        let (tx, rx) = crossbeam_channel::unbounded::<&PathBuf>();
        std::thread::scope(|s| {
            let mut workers = Vec::with_capacity(threads);
            for _ in 0..threads {
                let rx = rx.clone();
                workers.push(s.spawn(move || -> Result<Vec<Article>> {
                    let mut parsed = Vec::new();
                    for source in rx {
                        parsed.push(self.parse_article(source)?);
                    }
                    Ok(parsed)
                }));
            }

            for source in sources {
                if tx.send(source).is_err() {
                    // Every worker is gone, which means one of them
                    // already failed; the join below reports it.
                    break;
                }
            }
            drop(tx);

            let mut articles = Vec::with_capacity(sources.len());
            for worker in workers {
                // join only fails if the worker panicked
                articles.extend(worker.join().unwrap()?);
            }
            Ok(articles)
        })
    }

    fn parse_article(&self, source: &Path) -> Result<Article> {
        match self.parse_source(source) {
            Ok(article) => Ok(article),
            Err(e) => Err(Error::Annotated(
                format!("parsing article `{}`", source.display()),
                Box::new(e),
            )),
        }
    }

    fn parse_source(&self, source: &Path) -> Result<Article> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(source)?.read_to_string(&mut contents)?;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(&contents)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&contents[yaml_start..yaml_stop])?;
        let pin = validated_pin(frontmatter.pin)?;
        let abbrlink = validated_abbrlink(frontmatter.abbrlink)?;

        let mut body = String::new();
        html::push_html(
            &mut body,
            Parser::new_ext(&contents[body_start..], markdown_options()),
        );

        Ok(Article {
            id: self.article_id(source)?,
            lang: frontmatter.lang,
            title: frontmatter.title,
            description: frontmatter.description,
            published: frontmatter.published,
            update: frontmatter.update,
            tags: frontmatter.tags,
            draft: frontmatter.draft,
            pin,
            abbrlink,
            toc: frontmatter.toc.unwrap_or(self.default_toc),
            body,
            minutes: None,
        })
    }

    /// The id for an article at `source`: the path relative to the
    /// articles directory, less the extension, slugified so it can be
    /// dropped into a URL as-is.
    fn article_id(&self, source: &Path) -> Result<String> {
        let relative = source
            .strip_prefix(self.articles_directory)
            .unwrap_or(source);
        let stem = relative.with_extension("");
        match stem.to_str() {
            Some(stem) => Ok(slug::slugify(stem)),
            None => Err(Error::InvalidFileName(relative.to_owned())),
        }
    }
}

fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                        // yaml_start
            FENCE.len() + offset,               // yaml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )),
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn validated_pin(pin: i64) -> Result<u8> {
    if (0..=99).contains(&pin) {
        Ok(pin as u8)
    } else {
        Err(Error::PinOutOfRange(pin))
    }
}

fn validated_abbrlink(abbrlink: String) -> Result<String> {
    let well_formed = abbrlink
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(abbrlink)
    } else {
        Err(Error::MalformedAbbrlink(abbrlink))
    }
}

/// The frontmatter schema. Only `title` and `published` are required;
/// everything else defaults the way the theme documents.
#[derive(Deserialize)]
struct Frontmatter {
    title: String,

    published: NaiveDate,

    #[serde(default)]
    description: String,

    /// Authors sometimes leave `update:` as an empty string rather than
    /// deleting the line; treat that the same as absent.
    #[serde(default, deserialize_with = "empty_as_none")]
    update: Option<NaiveDate>,

    #[serde(default)]
    tags: Vec<String>,

    #[serde(default)]
    lang: String,

    #[serde(default)]
    draft: bool,

    #[serde(default)]
    pin: i64,

    #[serde(default)]
    abbrlink: String,

    #[serde(default)]
    toc: Option<bool>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// The render collaborator: computes the lazily attached per-article
/// metadata. The query layer calls this through its memoization cache,
/// possibly from several worker threads at once.
pub trait Render: Send + Sync {
    fn render(&self, article: &Article) -> std::result::Result<RenderMeta, RenderError>;
}

/// Metadata attached to an article on first access.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderMeta {
    /// Estimated reading time in minutes.
    pub minutes: f64,
}

/// The default renderer: words in the tag-stripped body at a fixed
/// reading speed, never less than a minute.
pub struct ReadingTime {
    pub words_per_minute: usize,
}

impl Default for ReadingTime {
    fn default() -> ReadingTime {
        ReadingTime {
            words_per_minute: 200,
        }
    }
}

impl Render for ReadingTime {
    fn render(&self, article: &Article) -> std::result::Result<RenderMeta, RenderError> {
        let words = plain_text(&article.body).split_whitespace().count();
        let minutes = (words as f64 / self.words_per_minute as f64).ceil().max(1.0);
        Ok(RenderMeta { minutes })
    }
}

/// Represents a failed metadata computation.
#[derive(Debug)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rendering article metadata: {}", self.0)
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of an article-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading an [`Article`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a source file is missing its terminal frontmatter
    /// fence (the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `pin` falls outside `0..=99`.
    PinOutOfRange(i64),

    /// Returned when `abbrlink` contains anything but lowercase ASCII
    /// letters, digits, and hyphens.
    MalformedAbbrlink(String),

    /// Returned when a source file's path isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Article must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::PinOutOfRange(pin) => {
                write!(f, "`pin` must be between 0 and 99, got {}", pin)
            }
            Error::MalformedAbbrlink(abbrlink) => {
                write!(
                    f,
                    "`abbrlink` can only contain lowercase letters, numbers and hyphens, got `{}`",
                    abbrlink
                )
            }
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::PinOutOfRange(_) => None,
            Error::MalformedAbbrlink(_) => None,
            Error::InvalidFileName(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us
    /// to use the `?` operator for frontmatter deserialization.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the articles directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;
    use crate::testutil::article;

    fn write_article(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_parses_frontmatter_and_body() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        write_article(
            dir.path(),
            "hello-world.md",
            "---\n\
             title: Hello, world!\n\
             published: 2024-01-10\n\
             description: a greeting\n\
             tags: [greet, demo]\n\
             pin: 5\n\
             ---\n\
             # Hello\n\nWorld\n",
        );

        let articles = Loader::new(dir.path(), true).load(1)?;
        assert_eq!(1, articles.len());
        let a = &articles[0];
        assert_eq!("hello-world", a.id);
        assert_eq!("Hello, world!", a.title);
        assert_eq!("a greeting", a.description);
        assert_eq!("2024-01-10".parse::<NaiveDate>().unwrap(), a.published);
        assert_eq!(vec!["greet", "demo"], a.tags);
        assert_eq!(5, a.pin);
        assert!(!a.draft);
        assert!(a.toc);
        assert_eq!(None, a.update);
        assert_eq!(None, a.minutes);
        assert!(a.body.contains("<h1>Hello</h1>"));
        Ok(())
    }

    #[test]
    fn test_load_nested_sources_get_path_based_ids() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        write_article(
            dir.path(),
            "2024/first post.md",
            "---\ntitle: First\npublished: 2024-01-10\n---\nbody\n",
        );

        let articles = Loader::new(dir.path(), false).load(1)?;
        assert_eq!("2024-first-post", articles[0].id);
        Ok(())
    }

    #[test]
    fn test_load_order_is_canonical() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zulu.md", "alpha.md", "mike.md"] {
            write_article(
                dir.path(),
                name,
                "---\ntitle: t\npublished: 2024-01-10\n---\nbody\n",
            );
        }

        let sequential = Loader::new(dir.path(), false).load(1)?;
        let parallel = Loader::new(dir.path(), false).load(4)?;
        let ids: Vec<&str> = sequential.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(vec!["alpha", "mike", "zulu"], ids);
        assert_eq!(sequential, parallel);
        Ok(())
    }

    #[test]
    fn test_empty_update_means_absent() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        write_article(
            dir.path(),
            "a.md",
            "---\ntitle: t\npublished: 2024-01-10\nupdate: ''\n---\nbody\n",
        );
        write_article(
            dir.path(),
            "b.md",
            "---\ntitle: t\npublished: 2024-01-10\nupdate: 2024-02-01\n---\nbody\n",
        );

        let articles = Loader::new(dir.path(), false).load(1)?;
        assert_eq!(None, articles[0].update);
        assert_eq!(
            Some("2024-02-01".parse::<NaiveDate>().unwrap()),
            articles[1].update,
        );
        Ok(())
    }

    #[test]
    fn test_pin_out_of_range_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_article(
            dir.path(),
            "a.md",
            "---\ntitle: t\npublished: 2024-01-10\npin: 100\n---\nbody\n",
        );

        match Loader::new(dir.path(), false).load(1).unwrap_err() {
            Error::Annotated(_, inner) => {
                assert!(matches!(*inner, Error::PinOutOfRange(100)))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_abbrlink_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_article(
            dir.path(),
            "a.md",
            "---\ntitle: t\npublished: 2024-01-10\nabbrlink: Not OK\n---\nbody\n",
        );

        match Loader::new(dir.path(), false).load(1).unwrap_err() {
            Error::Annotated(_, inner) => {
                assert!(matches!(*inner, Error::MalformedAbbrlink(_)))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_fences_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_article(dir.path(), "a.md", "title: t\n");

        match Loader::new(dir.path(), false).load(1).unwrap_err() {
            Error::Annotated(_, inner) => {
                assert!(matches!(*inner, Error::FrontmatterMissingStartFence))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_reading_time_rounds_up_with_a_floor() {
        let reading_time = ReadingTime {
            words_per_minute: 10,
        };

        let mut short = article("short", "2024-01-10");
        short.body = String::from("<p>just a few words here</p>");
        assert_eq!(
            RenderMeta { minutes: 1.0 },
            reading_time.render(&short).unwrap(),
        );

        let mut long = article("long", "2024-01-10");
        long.body = format!("<p>{}</p>", ["word"; 25].join(" "));
        assert_eq!(
            RenderMeta { minutes: 3.0 },
            reading_time.render(&long).unwrap(),
        );
    }
}
