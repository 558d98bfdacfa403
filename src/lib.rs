//! sysdump - Collect a point-in-time diagnostic bundle from a Kubernetes cluster

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod sysdump;
