//! Name search over scan results
//!
//! A query is a case-insensitive pattern when it looks like one: it contains
//! `*`, a `[...]` class or `\d`, or is wrapped in `/.../`. Anything else,
//! including a pattern that fails to compile, is a plain substring match.

use regex::{Regex, RegexBuilder};

/// Compiled search query
#[derive(Debug, Clone)]
pub enum NameQuery {
    Pattern(Regex),
    Substring(String),
}

impl NameQuery {
    pub fn parse(query: &str) -> Self {
        let query = query.to_lowercase();
        if !looks_like_pattern(&query) {
            return NameQuery::Substring(query);
        }

        // `/re/` is taken as written; otherwise `*` is a glob wildcard
        let pattern = match query.strip_prefix('/').and_then(|q| q.strip_suffix('/')) {
            Some(inner) if !inner.is_empty() => inner.to_string(),
            _ => query.replace('*', ".*"),
        };

        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => NameQuery::Pattern(regex),
            Err(e) => {
                tracing::debug!("Invalid search pattern {:?}, matching literally: {}", pattern, e);
                NameQuery::Substring(query)
            }
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameQuery::Pattern(regex) => regex.is_match(name),
            NameQuery::Substring(query) => name.to_lowercase().contains(query.as_str()),
        }
    }
}

fn looks_like_pattern(query: &str) -> bool {
    query.contains('*')
        || query.contains("\\d")
        || (query.len() > 1 && query.starts_with('/') && query.ends_with('/'))
        || (query.contains('[') && query.contains(']'))
}
