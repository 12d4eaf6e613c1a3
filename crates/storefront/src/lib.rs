//! MON Clothing & Jewellery storefront library.
//!
//! Server-rendered shop backed by Wix Headless: catalog, cart, checkout
//! hand-off and member accounts. The binary in `main.rs` wires Sentry and
//! tracing around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod wix;
