//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Guard, generator and reload paths produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (guard decision counters, registry gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
