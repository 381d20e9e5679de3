//! The query layer: pure, memoized derivations over the loaded article
//! set.
//!
//! Every operation is a function of the full set plus, at most, one
//! scalar argument. Results come back as shared [`Arc`] records, so the
//! derived views reference the same immutable articles instead of
//! copying or mutating them, and repeated calls return the memoized
//! value unchanged.
//!
//! The draft mode and the listing language are resolved once, at
//! construction, from the collaborator boundary; nothing in this module
//! reaches for an implicit default.

use std::collections::HashSet;
use std::sync::Arc;

use crate::article::Article;
use crate::cache::Memo;
use crate::store::{Render, RenderError};

/// The result of a query-layer operation. Only the render collaborator
/// can fail; everything else is pure computation over loaded records.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Whether draft articles are part of the visible set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Drafts are hidden.
    Production,

    /// Drafts are listed like everything else.
    Preview,
}

/// Derives the listing views for one build. Owns the raw records, the
/// render collaborator, and one memo per operation; created when the
/// build starts and dropped with it.
pub struct Queries {
    /// Raw records in canonical collection order.
    articles: Vec<Arc<Article>>,
    renderer: Arc<dyn Render>,
    mode: Mode,
    /// The resolved listing language. Universal articles (empty `lang`)
    /// are visible regardless.
    lang: String,
    /// Worker count for the reading-time fan-out.
    threads: usize,

    all: Memo<(), Vec<Arc<Article>>>,
    regular: Memo<(), Vec<Arc<Article>>>,
    pinned: Memo<(), Vec<Arc<Article>>>,
    by_year: Memo<(), Vec<(i32, Vec<Arc<Article>>)>>,
    groups: Memo<(), Arc<Vec<(String, Vec<Arc<Article>>)>>>,
    tags: Memo<(), Vec<String>>,
    by_tag: Memo<String, Vec<Arc<Article>>>,
    duplicates: Memo<(), Vec<String>>,
    minutes: Memo<(String, String), f64>,
}

impl Queries {
    pub fn new(
        articles: Vec<Article>,
        renderer: Arc<dyn Render>,
        mode: Mode,
        lang: impl Into<String>,
        threads: usize,
    ) -> Queries {
        Queries {
            articles: articles.into_iter().map(Arc::new).collect(),
            renderer,
            mode,
            lang: lang.into(),
            threads,
            all: Memo::new(),
            regular: Memo::new(),
            pinned: Memo::new(),
            by_year: Memo::new(),
            groups: Memo::new(),
            tags: Memo::new(),
            by_tag: Memo::new(),
            duplicates: Memo::new(),
            minutes: Memo::new(),
        }
    }

    /// Every article visible in the resolved language, drafts excluded
    /// in production. Reading-time minutes are attached (computed across
    /// the worker pool on first call). Sorted by publication date,
    /// newest first; ties keep collection order.
    pub fn articles(&self) -> Result<Vec<Arc<Article>>> {
        self.all.get_or_try_compute((), || {
            let visible: Vec<&Arc<Article>> = self
                .articles
                .iter()
                .filter(|a| self.mode == Mode::Preview || !a.draft)
                .filter(|a| a.lang.is_empty() || a.lang == self.lang)
                .collect();

            let minutes = self.compute_minutes(&visible)?;
            let mut enhanced: Vec<Arc<Article>> = visible
                .iter()
                .zip(minutes)
                .map(|(article, minutes)| {
                    Arc::new(Article {
                        minutes: Some(minutes),
                        ..(***article).clone()
                    })
                })
                .collect();

            enhanced.sort_by(|a, b| b.published.cmp(&a.published));
            Ok(enhanced)
        })
    }

    /// The non-pinned slice of [`Queries::articles`], in the same order.
    pub fn regular_articles(&self) -> Result<Vec<Arc<Article>>> {
        self.regular.get_or_try_compute((), || {
            Ok(self
                .articles()?
                .into_iter()
                .filter(|a| a.pin == 0)
                .collect())
        })
    }

    /// Pinned articles by descending priority. The sort is stable, so
    /// equal priorities keep the date order from [`Queries::articles`].
    pub fn pinned_articles(&self) -> Result<Vec<Arc<Article>>> {
        self.pinned.get_or_try_compute((), || {
            let mut pinned: Vec<Arc<Article>> = self
                .articles()?
                .into_iter()
                .filter(|a| a.pin > 0)
                .collect();
            pinned.sort_by(|a, b| b.pin.cmp(&a.pin));
            Ok(pinned)
        })
    }

    /// Regular articles bucketed by publication year, newest year first.
    /// Within a year the sort looks at month then day only, so articles
    /// sharing a calendar day keep their relative order.
    pub fn articles_by_year(&self) -> Result<Vec<(i32, Vec<Arc<Article>>)>> {
        self.by_year.get_or_try_compute((), || {
            let mut years: Vec<(i32, Vec<Arc<Article>>)> = Vec::new();
            for article in self.regular_articles()? {
                let year = article.year();
                match years.iter_mut().find(|(y, _)| *y == year) {
                    Some((_, bucket)) => bucket.push(article),
                    None => years.push((year, vec![article])),
                }
            }
            for (_, bucket) in years.iter_mut() {
                bucket.sort_by(|a, b| (b.month(), b.day()).cmp(&(a.month(), a.day())));
            }
            years.sort_by(|a, b| b.0.cmp(&a.0));
            Ok(years)
        })
    }

    /// Tag → articles, in first-encounter order over the date-sorted
    /// list. An article appears under every tag occurrence it authored,
    /// duplicates included.
    pub fn tag_groups(&self) -> Result<Arc<Vec<(String, Vec<Arc<Article>>)>>> {
        self.groups.get_or_try_compute((), || {
            let mut groups: Vec<(String, Vec<Arc<Article>>)> = Vec::new();
            for article in self.articles()? {
                for tag in &article.tags {
                    match groups.iter_mut().find(|(name, _)| name == tag) {
                        Some((_, members)) => members.push(Arc::clone(&article)),
                        None => groups.push((tag.clone(), vec![Arc::clone(&article)])),
                    }
                }
            }
            Ok(Arc::new(groups))
        })
    }

    /// Tags ranked by how many articles carry them, most popular first.
    /// The sort is stable, so equal counts keep first-encounter order.
    pub fn all_tags(&self) -> Result<Vec<String>> {
        self.tags.get_or_try_compute((), || {
            let groups = self.tag_groups()?;
            let mut ranked: Vec<(&String, usize)> = groups
                .iter()
                .map(|(tag, members)| (tag, members.len()))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));
            Ok(ranked.into_iter().map(|(tag, _)| tag.clone()).collect())
        })
    }

    /// The articles carrying `tag`. Unknown tags are an empty list,
    /// never an error.
    pub fn articles_by_tag(&self, tag: &str) -> Result<Vec<Arc<Article>>> {
        self.by_tag.get_or_try_compute(tag.to_owned(), || {
            let groups = self.tag_groups()?;
            Ok(groups
                .iter()
                .find(|(name, _)| name == tag)
                .map(|(_, members)| members.clone())
                .unwrap_or_default())
        })
    }

    /// Scans the full set--drafts included, since this is a correctness
    /// check--for effective-slug collisions and describes each one.
    ///
    /// Collisions are scoped per language partition. Articles with no
    /// language are universal and visible in every locale, so their
    /// slugs are also checked against each locale's set; a collision
    /// between two universal articles is reported once, not once per
    /// locale.
    pub fn duplicate_slugs(&self) -> Vec<String> {
        self.duplicates.get_or_compute((), || {
            let mut messages = Vec::new();

            let mut universal_slugs: HashSet<&str> = HashSet::new();
            for article in self.articles.iter().filter(|a| a.lang.is_empty()) {
                if !universal_slugs.insert(article.slug()) {
                    messages.push(format!("Duplicate slug \"{}\" found", article.slug()));
                }
            }

            let mut locales: Vec<&str> = self
                .articles
                .iter()
                .filter(|a| !a.lang.is_empty())
                .map(|a| a.lang.as_str())
                .collect();
            locales.sort_unstable();
            locales.dedup();

            for locale in locales {
                let mut seen = universal_slugs.clone();
                for article in self.articles.iter().filter(|a| a.lang == locale) {
                    if !seen.insert(article.slug()) {
                        messages.push(format!(
                            "Duplicate slug \"{}\" found in language \"{}\"",
                            article.slug(),
                            locale,
                        ));
                    }
                }
            }

            messages
        })
    }

    fn compute_minutes(&self, articles: &[&Arc<Article>]) -> Result<Vec<f64>> {
        if self.threads < 2 || articles.len() < 2 {
            return articles
                .iter()
                .map(|article| self.minutes_for(article))
                .collect();
        }

        // Fan out across a worker pool. The per-(id, lang) memo keeps
        // racing workers consistent and the index keeps the output order
        // deterministic no matter which worker finishes first.
        let (tx, rx) = crossbeam_channel::unbounded::<usize>();
        std::thread::scope(|s| {
            let mut workers = Vec::with_capacity(self.threads);
            for _ in 0..self.threads {
                let rx = rx.clone();
                workers.push(s.spawn(move || -> Result<Vec<(usize, f64)>> {
                    let mut computed = Vec::new();
                    for i in rx {
                        computed.push((i, self.minutes_for(articles[i])?));
                    }
                    Ok(computed)
                }));
            }

            for i in 0..articles.len() {
                if tx.send(i).is_err() {
                    // Every worker is gone, which means one of them
                    // already failed; the join below reports it.
                    break;
                }
            }
            drop(tx);

            let mut minutes = vec![0.0; articles.len()];
            for worker in workers {
                // join only fails if the worker panicked
                for (i, m) in worker.join().unwrap()? {
                    minutes[i] = m;
                }
            }
            Ok(minutes)
        })
    }

    fn minutes_for(&self, article: &Arc<Article>) -> Result<f64> {
        self.minutes.get_or_try_compute(
            (article.id.clone(), article.lang.clone()),
            || self.renderer.render(article).map(|meta| meta.minutes),
        )
    }
}
