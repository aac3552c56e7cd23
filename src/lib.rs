//! Fcircle - A friend circle feed aggregator
//!
//! This crate crawls the RSS/Atom feeds of a list of friends' blogs, reduces
//! each entry to a short sanitized summary, and groups the newest articles by
//! source domain for display on a single page.

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod friends;
pub mod models;
pub mod sanitize;
pub mod timezone;
pub mod truncate;
