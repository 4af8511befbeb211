//! The host router's registry of named builders.

use std::collections::BTreeMap;

use crate::config::schema::RouteConfig;
use crate::policy::UrlParams;
use crate::routes::builder::UrlBuilder;

/// Builders keyed by name. Names are unique; inserting an existing name
/// replaces the previous builder.
#[derive(Debug, Clone, Default)]
pub struct BuilderSet {
    builders: BTreeMap<String, UrlBuilder>,
}

impl BuilderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `<name>_url`, `<name>_path` and `hash_for_<name>_url`
    /// builders for every configured route.
    pub fn from_routes(routes: &[RouteConfig], origin: &UrlParams) -> Self {
        let mut set = Self::new();
        for route in routes {
            set.insert(UrlBuilder::url_for_pattern(
                format!("{}_url", route.name),
                &route.path,
                origin.clone(),
            ));
            set.insert(UrlBuilder::path_for_pattern(
                format!("{}_path", route.name),
                &route.path,
            ));
            set.insert(UrlBuilder::params_for_pattern(
                format!("hash_for_{}_url", route.name),
                &route.path,
            ));
        }
        set
    }

    pub fn insert(&mut self, builder: UrlBuilder) -> Option<UrlBuilder> {
        self.builders.insert(builder.name().to_string(), builder)
    }

    pub fn with(mut self, builder: UrlBuilder) -> Self {
        self.insert(builder);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UrlBuilder> {
        self.builders.get(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UrlBuilder> {
        self.builders.values()
    }
}
