//! Named URL builders and their protocol variants.
//!
//! # Data Flow
//! ```text
//! Host router (all routes registered)
//!     → set.rs (BuilderSet: name → UrlBuilder)
//!     → filter.rs (keep absolute-URL builders only)
//!     → generator.rs (ssl_* / plain_* wrappers)
//!     → DerivedBuilderRegistry (frozen, published inside the state snapshot)
//! ```

pub mod builder;
pub mod filter;
pub mod generator;
pub mod set;

pub use builder::{BuilderKind, RouteArg, RoutePattern, UrlBuilder, UrlError, UrlOptions};
pub use filter::{HelperFilter, NameFilter};
pub use generator::{generate, DerivedBuilderRegistry, VariantPair, INSECURE_PREFIX, SECURE_PREFIX};
pub use set::BuilderSet;
