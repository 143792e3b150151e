//! Cache-related MCP tools.
//!
//! This module provides tools for warming, clearing and inspecting the asset cache.

pub mod clear;
pub mod status;
pub mod warm;

pub use clear::clear_impl;
pub use status::status_impl;
pub use warm::{CacheWarmParams, warm_impl};
