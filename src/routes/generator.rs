//! `ssl_` / `plain_` variant generation.
//!
//! # Responsibilities
//! - Select the builders that produce absolute URLs
//! - Wrap each one twice: forcing the secure and the insecure parameters
//! - Collect the wrappers into an immutable registry
//!
//! # Design Decisions
//! - Pure mapping: the input set is never modified
//! - Policy values overwrite caller-supplied scheme/host/port
//! - An empty input yields `None` ("not ready yet"), not an error

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::policy::{ProtocolPolicy, UrlParams};
use crate::routes::builder::{BuilderKind, RouteArg, UrlBuilder, UrlError, UrlOptions};
use crate::routes::filter::HelperFilter;
use crate::routes::set::BuilderSet;

pub const SECURE_PREFIX: &str = "ssl_";
pub const INSECURE_PREFIX: &str = "plain_";

/// The two protocol variants of one base builder.
#[derive(Debug, Clone)]
pub struct VariantPair {
    pub secure: UrlBuilder,
    pub insecure: UrlBuilder,
}

/// Frozen mapping from base builder name to its variants.
///
/// There is no way to add or remove entries after generation; a changed
/// builder set produces a new registry.
#[derive(Debug)]
pub struct DerivedBuilderRegistry {
    variants: BTreeMap<String, VariantPair>,
}

impl DerivedBuilderRegistry {
    /// Variants of the base builder `name`.
    pub fn variants(&self, name: &str) -> Option<&VariantPair> {
        self.variants.get(name)
    }

    /// The `ssl_` variant of `name`.
    pub fn secure(&self, name: &str) -> Option<&UrlBuilder> {
        self.variants.get(name).map(|pair| &pair.secure)
    }

    /// The `plain_` variant of `name`.
    pub fn insecure(&self, name: &str) -> Option<&UrlBuilder> {
        self.variants.get(name).map(|pair| &pair.insecure)
    }

    /// Look a variant up by its full name, e.g. `ssl_profile_url`.
    pub fn get(&self, helper: &str) -> Option<&UrlBuilder> {
        if let Some(base) = helper.strip_prefix(SECURE_PREFIX) {
            self.secure(base)
        } else if let Some(base) = helper.strip_prefix(INSECURE_PREFIX) {
            self.insecure(base)
        } else {
            None
        }
    }

    /// Call a variant by its full name.
    pub fn call(&self, helper: &str, args: &[RouteArg]) -> Result<String, UrlError> {
        self.get(helper)
            .ok_or_else(|| UrlError::UnknownHelper(helper.to_string()))?
            .call(args)
    }

    /// Base builder names that have variants.
    pub fn base_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// All variant names (`ssl_*` and `plain_*`).
    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.variants
            .values()
            .flat_map(|pair| [pair.secure.name(), pair.insecure.name()])
    }

    /// Number of base builders covered.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Derive the variant registry for `builders` under `policy`.
///
/// Returns `None` when no builder passes `filter`; the caller should try
/// again once the host router has registered its routes.
pub fn generate(
    builders: &BuilderSet,
    policy: &ProtocolPolicy,
    filter: &dyn HelperFilter,
) -> Option<DerivedBuilderRegistry> {
    let variants: BTreeMap<String, VariantPair> = builders
        .iter()
        .filter(|builder| filter.accepts(builder))
        .map(|builder| {
            let pair = VariantPair {
                secure: variant(SECURE_PREFIX, builder, policy, policy.secure()),
                insecure: variant(INSECURE_PREFIX, builder, policy, policy.insecure()),
            };
            (builder.name().to_string(), pair)
        })
        .collect();

    if variants.is_empty() {
        tracing::debug!(builders = builders.len(), "No URL helpers to wrap yet");
        return None;
    }

    tracing::debug!(helpers = variants.len(), "Generated SSL helper variants");
    Some(DerivedBuilderRegistry { variants })
}

fn variant(
    prefix: &str,
    base: &UrlBuilder,
    policy: &ProtocolPolicy,
    params: &UrlParams,
) -> UrlBuilder {
    let base = base.clone();
    let forced = (!policy.is_pass_through()).then(|| Arc::new(params.clone()));
    let name = format!("{prefix}{}", base.name());

    UrlBuilder::new(name, BuilderKind::Url, move |args| match &forced {
        Some(forced) => base.call(&alter(args, forced)),
        None => base.call(args),
    })
}

/// Merge `forced` into the trailing options argument, appending one if the
/// call has none.
fn alter(args: &[RouteArg], forced: &UrlParams) -> Vec<RouteArg> {
    let mut args = args.to_vec();
    let mut options = match args.pop() {
        Some(RouteArg::Options(options)) => options,
        Some(other) => {
            args.push(other);
            UrlOptions::default()
        }
        None => UrlOptions::default(),
    };
    options.force(forced);
    args.push(RouteArg::Options(options));
    args
}
