//! Command implementations

pub mod sysdump;

pub use sysdump::*;
