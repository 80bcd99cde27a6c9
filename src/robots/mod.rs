//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{is_allowed, parse_robots, RobotsPolicy};
