//! MON Core - Shared domain types.
//!
//! Types used by the storefront binary and its tests:
//! - `storefront` - Public-facing shop backed by the Wix Headless APIs
//! - `integration-tests` - Cross-module HTTP scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
