//! voltarget: volatility-targeting backtester for a single asset.
//!
//! Hexagonal architecture: the pure pipeline lives in [`domain`], collaborator
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
