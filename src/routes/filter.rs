//! Selection of the builders that get protocol variants.
//!
//! Only builders producing absolute URLs make sense to force onto a
//! protocol: path-only helpers carry no scheme or host, and parameter-map
//! helpers never resolve to a URL at all. Which names denote such helpers
//! depends on the host router, so the name patterns are configurable.

use crate::config::schema::HelperConfig;
use crate::routes::builder::{BuilderKind, UrlBuilder};

/// Predicate deciding whether a builder receives variants.
pub trait HelperFilter: Send + Sync {
    fn accepts(&self, builder: &UrlBuilder) -> bool;
}

impl<F> HelperFilter for F
where
    F: Fn(&UrlBuilder) -> bool + Send + Sync,
{
    fn accepts(&self, builder: &UrlBuilder) -> bool {
        self(builder)
    }
}

/// Accepts URL builders whose names match none of the excluded patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    exclude_prefixes: Vec<String>,
    exclude_suffixes: Vec<String>,
}

impl NameFilter {
    pub fn new(exclude_prefixes: Vec<String>, exclude_suffixes: Vec<String>) -> Self {
        Self {
            exclude_prefixes,
            exclude_suffixes,
        }
    }

    pub fn from_config(config: &HelperConfig) -> Self {
        Self::new(
            config.exclude_prefixes.clone(),
            config.exclude_suffixes.clone(),
        )
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        Self::from_config(&HelperConfig::default())
    }
}

impl HelperFilter for NameFilter {
    fn accepts(&self, builder: &UrlBuilder) -> bool {
        let name = builder.name();
        builder.kind() == BuilderKind::Url
            && !self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            && !self.exclude_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(name: &str) -> UrlBuilder {
        UrlBuilder::new(name, BuilderKind::Url, |_| Ok(String::new()))
    }

    #[test]
    fn test_default_filter() {
        let filter = NameFilter::default();
        assert!(filter.accepts(&url("profile_url")));
        assert!(!filter.accepts(&url("hash_for_profile_url")));
        assert!(!filter.accepts(&url("formatted_profile_url")));
        assert!(!filter.accepts(&url("polymorphic_url")));
        assert!(!filter.accepts(&url("redirect_url")));
        assert!(!filter.accepts(&url("profile_path")));
    }

    #[test]
    fn test_kind_is_checked() {
        let filter = NameFilter::new(vec![], vec![]);
        assert!(!filter.accepts(&UrlBuilder::path_for_pattern("profile", "/p")));
        assert!(!filter.accepts(&UrlBuilder::params_for_pattern("profile", "/p")));
    }

    #[test]
    fn test_closure_filter() {
        let filter = |b: &UrlBuilder| b.name().starts_with("admin_");
        assert!(filter.accepts(&url("admin_url")));
        assert!(!filter.accepts(&url("profile_url")));
    }
}
