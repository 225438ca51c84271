//! Layered settings resolution for backend services.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod settings;
pub mod store;
