//! iocscope: threat-intelligence verdicts for indicators of compromise.
//!
//! This crate wraps the [`ioc_intel`] analysis engine for operational use:
//! Config file → Provider registry → Analyzer → Verdict cache → JSON reports
//!
//! # Architecture
//!
//! - **Config**: TOML file plus API keys from the environment
//! - **Registry**: Instantiates the enabled built-in providers
//! - **Service**: Runs single and batch analyses with a per-instance cache
//! - **Reports**: Serializable results with ids, timestamps and provider outcomes

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod service;

pub use config::ScopeConfig;
pub use error::{Result, ScopeError};
pub use report::{AnalysisReport, BatchReport, FailedIndicator};
pub use service::IocScope;
