//! Core domain + application logic for the channel append tool.
//!
//! This crate is intentionally provider-agnostic. The Telegram client lives
//! behind a port (trait) implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod editor;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod messaging;
pub mod text;

pub use errors::{Error, Fault, Result};
