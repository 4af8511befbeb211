//! Process-wide SSL helper state.
//!
//! Everything derived from configuration, the variant registry included, is
//! held in one immutable [`Settings`] snapshot behind an `ArcSwap`. A writer
//! builds a complete new snapshot and publishes it with a single pointer
//! swap, so a request always sees a policy together with the helpers derived
//! from that same policy.
//!
//! # Lifecycle
//! ```text
//! startup:  from_config → Settings (no registry yet)
//!           register_builders(host routes) → generate → publish
//! reload:   Settings::from_config → generate against the current builders
//!           → publish (replaces; an empty result clears the registry)
//! request:  settings() → Arc snapshot, never partially built
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use axum::http::StatusCode;

use crate::config::schema::{ResponseConfig, SslConfig};
use crate::guard::rules::{SslRequirement, SslRules};
use crate::observability::metrics;
use crate::policy::{PolicyError, ProtocolPolicy};
use crate::routes::{generate, BuilderSet, DerivedBuilderRegistry, NameFilter};

/// Status codes the guard answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardResponses {
    pub redirect: StatusCode,
    pub reject: StatusCode,
}

impl Default for GuardResponses {
    fn default() -> Self {
        Self {
            redirect: StatusCode::FOUND,
            reject: StatusCode::MISDIRECTED_REQUEST,
        }
    }
}

impl GuardResponses {
    /// Convert configured codes, falling back to the defaults for codes
    /// outside the redirection / client-error classes.
    pub fn from_config(config: &ResponseConfig) -> Self {
        let defaults = Self::default();
        let redirect = StatusCode::from_u16(config.redirect_status)
            .ok()
            .filter(StatusCode::is_redirection)
            .unwrap_or(defaults.redirect);
        let reject = StatusCode::from_u16(config.reject_status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(defaults.reject);
        Self { redirect, reject }
    }
}

/// Immutable snapshot of everything built from one configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: ProtocolPolicy,
    pub rules: SslRules,
    pub responses: GuardResponses,
    pub filter: NameFilter,
    /// Whether forwarding headers count when detecting HTTPS.
    pub trust_forwarded: bool,
    /// Variants derived from the host's builders under `policy`; `None`
    /// until builders are registered or when none pass `filter`.
    pub registry: Option<Arc<DerivedBuilderRegistry>>,
}

impl Settings {
    pub fn from_config(config: &SslConfig) -> Result<Self, PolicyError> {
        Ok(Self {
            policy: ProtocolPolicy::from_config(config)?,
            rules: SslRules::from_config(&config.rules),
            responses: GuardResponses::from_config(&config.responses),
            filter: NameFilter::from_config(&config.helpers),
            trust_forwarded: config.listener.trust_forwarded_headers,
            registry: None,
        })
    }

    pub fn new(policy: ProtocolPolicy, rules: SslRules) -> Self {
        Self {
            policy,
            rules,
            responses: GuardResponses::default(),
            filter: NameFilter::default(),
            trust_forwarded: true,
            registry: None,
        }
    }

    /// Same settings with the registry regenerated from `builders`.
    fn derive(mut self, builders: &BuilderSet) -> Self {
        self.registry = generate(builders, &self.policy, &self.filter).map(Arc::new);
        match &self.registry {
            Some(registry) => {
                metrics::record_registry_rebuild(registry.len());
                tracing::info!(helpers = registry.len(), "Published SSL URL helpers");
            }
            None if !builders.is_empty() => {
                tracing::warn!(
                    builders = builders.len(),
                    "No URL builders pass the helper filter; ssl_/plain_ helpers cleared"
                );
            }
            None => {}
        }
        self
    }
}

/// Shared state: the current settings snapshot and the host's builders.
#[derive(Debug)]
pub struct SslState {
    settings: ArcSwap<Settings>,
    /// Last builder set handed over by the host. The lock also orders
    /// writers, so publications never overtake each other.
    builders: Mutex<Arc<BuilderSet>>,
}

impl SslState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            builders: Mutex::new(Arc::new(BuilderSet::new())),
        }
    }

    pub fn from_config(config: &SslConfig) -> Result<Self, PolicyError> {
        Ok(Self::new(Settings::from_config(config)?))
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// Current variant registry, if one has been generated.
    pub fn registry(&self) -> Option<Arc<DerivedBuilderRegistry>> {
        self.settings.load().registry.clone()
    }

    /// Requirement in force for `action` of `resource`.
    pub fn requirement(&self, resource: &str, action: &str) -> SslRequirement {
        self.settings.load().rules.resolve(resource, action)
    }

    /// Hand over the host router's builders once all routes are registered.
    ///
    /// Returns whether a registry was published. An empty set is a valid
    /// "not ready yet" state; call again once routes exist.
    pub fn register_builders(&self, builders: BuilderSet) -> bool {
        let mut current = self.builders.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(builders);

        let next = Settings::clone(&self.settings.load()).derive(&current);
        let published = next.registry.is_some();
        self.settings.store(Arc::new(next));
        published
    }

    /// Apply a new configuration wholesale and regenerate the variants.
    ///
    /// On error the running settings stay in place.
    pub fn reload(&self, config: &SslConfig) -> Result<(), PolicyError> {
        let builders = self.builders.lock().unwrap_or_else(PoisonError::into_inner);
        let next = Settings::from_config(config)?.derive(&builders);

        tracing::info!(
            secure = %next.policy.secure().origin(),
            insecure = %next.policy.insecure().origin(),
            "SSL settings reloaded"
        );
        self.settings.store(Arc::new(next));
        Ok(())
    }
}
