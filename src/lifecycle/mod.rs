//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build policy → Bind listeners
//!     → Register route builders → Publish variant registry
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → broadcast → listeners drain → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
