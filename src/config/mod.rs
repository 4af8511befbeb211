//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, hostname required)
//!     → SslConfig (validated, immutable)
//!     → ProtocolPolicy + SslRules built once from it
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of policy and derived registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields except `hostname` have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    HelperConfig, ListenerConfig, ResponseConfig, RouteConfig, RuleConfig, SslConfig,
    SslKeyword,
};
pub use validation::ValidationError;
