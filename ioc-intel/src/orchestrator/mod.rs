//! Source query orchestrator: concurrent, isolated provider fan-out.
//!
//! This module invokes every eligible provider on its own task, bounds each
//! task by that provider's timeout, and collects exactly one
//! [`ProviderOutcome`](crate::types::ProviderOutcome) per eligible provider.
//! Failures are recorded, never raised.

pub mod query;

pub use query::query;
