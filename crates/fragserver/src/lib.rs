//! fragserver - HTTP adapter for the fragments library.
//!
//! Library exposing the router and startup helpers for testing and reuse.

pub mod storage;
pub mod telemetry;
pub mod web;
