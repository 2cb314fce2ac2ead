//! Command entry points
//!
//! Thin glue between the CLI surface and the library: load settings, build
//! the run configuration, wire up the executor and event sink, render the
//! result.

pub mod config;
pub mod deploy;
pub mod health;
pub mod service;
