//! HTTP serving.
//!
//! # Data Flow
//! ```text
//! TCP (plain) / TLS connection
//!     → server.rs (Axum setup, transport marker, request ID, tracing)
//!     → guard middleware for the matched route
//!     → page handler, or redirect / reject
//! ```

pub mod server;

pub use server::{HttpServer, ServerError};
