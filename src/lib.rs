//! wise-cli library
//!
//! Exposes the API client, response cache, transfer ledger and command
//! dispatch so the binary and integration tests share one implementation.

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod output;
