//! The library code for the `haku` blog content engine. The architecture
//! can be generally broken down into three distinct steps:
//!
//! 1. Loading articles from source files on disk ([`crate::store`])
//! 2. Deriving the listing views the site is built from ([`crate::query`])
//! 3. Serializing the derived views into output documents ([`crate::feed`]
//!    and [`crate::sitemap`])
//!
//! Of the three, the second step is the interesting one. Every page the
//! theme renders--the chronological listing, the pinned shelf, the
//! per-year archive, the tag pages, the feed, the sitemap--is a pure
//! derivation over the same immutable set of [`crate::article::Article`]
//! records, and each derivation is memoized ([`crate::cache`]) so a build
//! computes each view exactly once no matter how many consumers ask for
//! it.
//!
//! The third step is deliberately thin: the serializers take the derived
//! views as plain data and assemble fixed-shape XML documents. Page
//! templates and styling are external collaborators and never appear
//! here; the closest this crate gets to presentation is the path builders
//! ([`crate::path`]) and page-type helpers ([`crate::page`]) those
//! collaborators call into.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod cache;
pub mod config;
pub mod description;
pub mod feed;
pub mod page;
pub mod path;
pub mod query;
pub mod sitemap;
pub mod store;
pub mod xml;

#[cfg(test)]
pub(crate) mod testutil;
