//! Ratewarden - In-Process Request Rate Limiting
//!
//! This crate bounds how many operations any single caller may perform
//! within a time window. It offers epoch-aligned fixed windows, per-caller
//! sliding windows and a small tier table mapping caller classes to fixed
//! window policies. All counters live in one in-memory store shared by the
//! limiters and a background janitor that evicts expired windows.

pub mod config;
pub mod error;
pub mod ratelimit;

pub use error::{RateLimitError, Result};
pub use ratelimit::{RateLimitDecision, RateLimitPolicy, RateLimiter, Tier};
